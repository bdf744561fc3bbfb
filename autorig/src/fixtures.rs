//! Test skeletons: a bare DAZ-style humanoid the builders run against.

use crate::names::{
    ARM_BONES, COLLAR, FINGERS, FOOT, HAND, LEG_BONES, METATARSALS, PECTORAL, SPINE_BONES, Side,
    TOE, TOES,
};
use crate::{Armature, Bone, MeshObject, Scene, SceneObject, ShapeKeySet};
use glam::Vec3;

fn mirror(side: Side) -> f32 {
    match side {
        Side::Left => 1.0,
        Side::Right => -1.0,
    }
}

/// An unrigged humanoid skeleton with the bone inventory the builders
/// expect: spine column, arms with fingers, legs with feet and toes.
pub fn humanoid() -> Armature {
    let mut bones: Vec<Bone> = Vec::new();

    // Spine column stacked up +Z from the hip.
    let mut z = 1.0;
    for (i, name) in SPINE_BONES.iter().enumerate() {
        let mut bone = Bone::new(name, Vec3::new(0.0, 0.0, z), Vec3::new(0.0, 0.0, z + 0.08));
        if i > 0 {
            bone.parent = Some(SPINE_BONES[i - 1].to_string());
        }
        bones.push(bone);
        z += 0.08;
    }

    for side in Side::BOTH {
        let sx = mirror(side);

        bones.push(
            Bone::new(
                &side.apply(PECTORAL),
                Vec3::new(sx * 0.08, -0.05, 1.35),
                Vec3::new(sx * 0.14, -0.1, 1.3),
            )
            .with_parent("chestUpper"),
        );

        // Arm chain out along X, hand and fingers past it.
        bones.push(
            Bone::new(
                &side.apply(COLLAR),
                Vec3::new(sx * 0.05, 0.0, 1.45),
                Vec3::new(sx * 0.15, 0.0, 1.45),
            )
            .with_parent("chestUpper"),
        );
        let mut x = 0.15;
        let mut arm_parent = side.apply(COLLAR);
        for name in ARM_BONES {
            let bone = Bone::new(
                &side.apply(name),
                Vec3::new(sx * x, 0.0, 1.45),
                Vec3::new(sx * (x + 0.15), 0.0, 1.45),
            )
            .with_parent(&arm_parent);
            arm_parent = bone.name.clone();
            bones.push(bone);
            x += 0.15;
        }
        bones.push(
            Bone::new(
                &side.apply(HAND),
                Vec3::new(sx * x, 0.0, 1.45),
                Vec3::new(sx * (x + 0.08), 0.0, 1.45),
            )
            .with_parent(&arm_parent),
        );
        for (f, finger) in FINGERS.iter().enumerate() {
            let y = 0.02 * f as f32 - 0.04;
            let mut finger_parent = side.apply(HAND);
            for segment in 1..=3 {
                let x0 = x + 0.08 + 0.03 * (segment - 1) as f32;
                let bone = Bone::new(
                    &side.apply(&format!("{finger}{segment}")),
                    Vec3::new(sx * x0, y, 1.45),
                    Vec3::new(sx * (x0 + 0.03), y, 1.45),
                )
                .with_parent(&finger_parent);
                finger_parent = bone.name.clone();
                bones.push(bone);
            }
        }

        // Leg chain straight down, foot running forward along +Y.
        let leg_tops = [1.0, 0.7, 0.4];
        let mut leg_parent = "hip".to_string();
        for (i, name) in LEG_BONES.iter().enumerate() {
            let top = leg_tops[i];
            let bone = Bone::new(
                &side.apply(name),
                Vec3::new(sx * 0.1, 0.0, top),
                Vec3::new(sx * 0.1, 0.0, top - 0.3),
            )
            .with_parent(&leg_parent);
            leg_parent = bone.name.clone();
            bones.push(bone);
        }
        bones.push(
            Bone::new(
                &side.apply(FOOT),
                Vec3::new(sx * 0.1, 0.0, 0.1),
                Vec3::new(sx * 0.1, 0.1, 0.05),
            )
            .with_parent(&leg_parent),
        );
        bones.push(
            Bone::new(
                &side.apply(METATARSALS),
                Vec3::new(sx * 0.1, 0.1, 0.05),
                Vec3::new(sx * 0.1, 0.17, 0.02),
            )
            .with_parent(&side.apply(FOOT)),
        );
        bones.push(
            Bone::new(
                &side.apply(TOE),
                Vec3::new(sx * 0.1, 0.17, 0.02),
                Vec3::new(sx * 0.1, 0.22, 0.02),
            )
            .with_parent(&side.apply(METATARSALS)),
        );
        for (t, toe) in TOES.iter().enumerate() {
            let tx = sx * (0.07 + 0.015 * t as f32);
            let first = Bone::new(
                &side.apply(toe),
                Vec3::new(tx, 0.22, 0.02),
                Vec3::new(tx, 0.25, 0.02),
            )
            .with_parent(&side.apply(TOE));
            let second = Bone::new(
                &side.apply(&format!("{toe}_2")),
                Vec3::new(tx, 0.25, 0.02),
                Vec3::new(tx, 0.27, 0.02),
            )
            .with_parent(&first.name);
            bones.push(first);
            bones.push(second);
        }
    }

    Armature::from_bones("Humanoid", bones).expect("fixture skeleton is well-formed")
}

/// A scene holding the humanoid as the active rig object.
pub fn rig_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add_object(SceneObject::rig("Figure", humanoid()));
    scene
}

/// Adds a mesh object with the given shape-key set, deformed by `rig`.
pub fn add_mesh(scene: &mut Scene, name: &str, keys: ShapeKeySet, rig: Option<&str>) {
    scene.objects.push(SceneObject::mesh(
        name,
        MeshObject {
            shape_keys: Some(keys),
            rig: rig.map(str::to_string),
        },
    ));
}

/// Asserting helper used across the suites.
pub fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-5,
        "expected {expected}, got {actual} (diff {diff})"
    );
}
