use crate::drivers::ShapeKeySet;
use crate::fixtures::{add_mesh, rig_scene};
use crate::names::shape_key_data_path;
use crate::{
    Armature, Bone, ConstraintKind, ConstraintTarget, Error, LayerMask, Outcome, Scene,
    SceneObject, dispatch,
};
use glam::Vec3;

fn full_rig_scene() -> Scene {
    let mut scene = rig_scene();
    dispatch("create_bone_groups", &mut scene).unwrap();
    dispatch("add_root_bone", &mut scene).unwrap();
    scene
}

#[test]
fn unknown_commands_are_rejected() {
    let mut scene = rig_scene();
    assert!(matches!(
        dispatch("frobnicate", &mut scene),
        Err(Error::UnknownCommand { name }) if name == "frobnicate"
    ));
}

#[test]
fn commands_cancel_without_an_active_rig() {
    let mut scene = Scene::new();
    assert_eq!(dispatch("rig_arm", &mut scene).unwrap(), Outcome::Cancelled);

    add_mesh(&mut scene, "Body", ShapeKeySet::new("Key"), None);
    scene.active = Some("Body".to_string());
    scene.selected = vec!["Body".to_string()];
    assert_eq!(dispatch("rig_arm", &mut scene).unwrap(), Outcome::Cancelled);
}

#[test]
fn rig_commands_restore_layer_visibility() {
    let mut scene = full_rig_scene();
    let saved = LayerMask::single(5);
    scene
        .active_rig_mut()
        .unwrap()
        .set_visible_layers(saved);

    assert_eq!(dispatch("rig_arm", &mut scene).unwrap(), Outcome::Finished);
    assert_eq!(
        scene.active_rig_mut().unwrap().visible_layers(),
        saved
    );
}

#[test]
fn failed_builders_still_restore_layer_visibility() {
    // A rig missing its arm bones makes rig_arm fail partway; the visibility
    // mask must come back regardless.
    let armature = Armature::from_bones(
        "Broken",
        vec![Bone::new("hip", Vec3::ZERO, Vec3::Z)],
    )
    .unwrap();
    let mut scene = Scene::new();
    scene.add_object(SceneObject::rig("Figure", armature));
    let saved = LayerMask::single(9);
    scene.active_rig_mut().unwrap().set_visible_layers(saved);

    let result = dispatch("rig_arm", &mut scene);
    assert!(matches!(result, Err(Error::UnknownBone { .. })));
    assert_eq!(scene.active_rig_mut().unwrap().visible_layers(), saved);
}

#[test]
fn full_pipeline_runs_through_the_table() {
    let mut scene = full_rig_scene();
    for command in [
        "rig_arm",
        "rig_leg",
        "add_foot_rocker",
        "add_finger_controller",
        "fix_hand_driver",
        "fix_foot_driver",
        "fix_shldr_driver",
        "shape_spine_bones",
        "shape_arm_bones",
        "shape_leg_bones",
        "shape_finger_bones",
    ] {
        assert_eq!(
            dispatch(command, &mut scene).unwrap(),
            Outcome::Finished,
            "command {command} should finish"
        );
    }
    let armature = scene.active_rig_mut().unwrap();
    for bone in [
        "Root",
        "Hand.controller.L",
        "Leg.controller.R",
        "Foot.Rocker.L",
        "Foot.MCH.R",
        "Finger.Ctrl.L",
        "Hand.driver.R",
        "Foot.driver.L",
        "Shldr.Drv.X.R",
    ] {
        assert!(armature.has_bone(bone), "missing {bone}");
    }
}

#[test]
fn transfer_selection_gate_mutates_nothing() {
    let mut scene = rig_scene();
    let mut src = ShapeKeySet::new("Key");
    src.drivers.add(&shape_key_data_path("Smile")).unwrap();
    add_mesh(&mut scene, "BodyA", src, Some("Figure"));
    add_mesh(&mut scene, "BodyB", ShapeKeySet::new("Key.001"), Some("Figure"));
    scene.active = Some("BodyA".to_string());

    for selected in [
        vec![],
        vec!["BodyA".to_string()],
        vec![
            "BodyA".to_string(),
            "BodyB".to_string(),
            "Figure".to_string(),
        ],
    ] {
        scene.selected = selected;
        assert_eq!(
            dispatch("transfer_drivers", &mut scene).unwrap(),
            Outcome::Cancelled
        );
        let dst = scene.object("BodyB").unwrap().shape_keys().unwrap();
        assert!(dst.drivers.is_empty(), "cancelled transfer must not mutate");
    }
}

#[test]
fn transfer_command_copies_between_selected_meshes() {
    let mut scene = rig_scene();
    let mut src = ShapeKeySet::new("Key");
    src.key_blocks.push("Smile".to_string());
    src.drivers.add(&shape_key_data_path("Smile")).unwrap();
    add_mesh(&mut scene, "BodyA", src, Some("Figure"));
    let mut dst = ShapeKeySet::new("Key.001");
    dst.key_blocks.push("Smile".to_string());
    add_mesh(&mut scene, "BodyB", dst, Some("Figure"));
    scene.active = Some("BodyA".to_string());
    scene.selected = vec!["BodyA".to_string(), "BodyB".to_string()];

    assert_eq!(
        dispatch("transfer_drivers", &mut scene).unwrap(),
        Outcome::Finished
    );
    let dst = scene.object("BodyB").unwrap().shape_keys().unwrap();
    assert!(dst.drivers.get(&shape_key_data_path("Smile")).is_some());
}

#[test]
fn constraint_bone_to_empty_pins_the_active_bone() {
    let mut scene = rig_scene();
    scene.object_mut("Figure").unwrap().translation = Vec3::new(0.0, 0.0, 0.5);
    let armature = scene.active_rig_mut().unwrap();
    armature.select_bone("Hand.L", false).unwrap();
    let head = armature.bone("Hand.L").unwrap().head;

    assert_eq!(
        dispatch("constraint_bone_to_empty", &mut scene).unwrap(),
        Outcome::Finished
    );

    let empty = scene.object("Empty").expect("empty object created");
    assert_eq!(empty.translation, head + Vec3::new(0.0, 0.0, 0.5));

    let armature = scene.active_rig_mut().unwrap();
    let hand = armature.bone("Hand.L").unwrap();
    let constraint = hand.constraints.last().unwrap();
    assert!(matches!(
        &constraint.kind,
        ConstraintKind::CopyLocation {
            target: ConstraintTarget::Object(name)
        } if name == "Empty"
    ));

    // A second empty gets a host-style numbered name.
    scene
        .active_rig_mut()
        .unwrap()
        .select_bone("Hand.R", false)
        .unwrap();
    dispatch("constraint_bone_to_empty", &mut scene).unwrap();
    assert!(scene.object("Empty.001").is_some());
}

#[test]
fn rename_commands_round_trip_daz_names() {
    let bones = vec![
        Bone::new("hip", Vec3::ZERO, Vec3::Z),
        Bone::new("lCollar", Vec3::ZERO, Vec3::X).with_parent("hip"),
        Bone::new("lShldrBend", Vec3::X, Vec3::new(2.0, 0.0, 0.0)).with_parent("lCollar"),
        Bone::new("rCollar", Vec3::ZERO, Vec3::NEG_X).with_parent("hip"),
    ];
    let mut scene = Scene::new();
    scene.add_object(SceneObject::rig(
        "Figure",
        Armature::from_bones("Figure", bones).unwrap(),
    ));

    dispatch("rename_bones", &mut scene).unwrap();
    let armature = scene.active_rig_mut().unwrap();
    assert!(armature.has_bone("Collar.L"));
    assert!(armature.has_bone("ShldrBend.L"));
    assert!(armature.has_bone("Collar.R"));
    assert!(armature.has_bone("hip"));
    assert_eq!(
        armature.bone("ShldrBend.L").unwrap().parent.as_deref(),
        Some("Collar.L")
    );

    dispatch("rename_bones_to_daz", &mut scene).unwrap();
    let armature = scene.active_rig_mut().unwrap();
    assert!(armature.has_bone("lShldrBend"));
    assert_eq!(
        armature.bone("lShldrBend").unwrap().parent.as_deref(),
        Some("lCollar")
    );
}
