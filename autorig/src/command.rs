//! The thin command layer: a static table mapping command names to handlers
//! over a [`Scene`] context, replacing host-side operator registration.
//!
//! Handlers check their preconditions first and report [`Outcome::Cancelled`]
//! before any mutation; failures past that point propagate and are not rolled
//! back.

use crate::drivers::{ShapeKeySet, fix_foot_driver, fix_hand_driver, fix_shldr_driver};
use crate::names::{LEG_BONES, LEG_CTRL, LEG_POLE, daz_to_suffix, suffix_to_daz};
use crate::transfer::{TransferParams, transfer_drivers};
use crate::{Armature, Constraint, Error, Mode, rig, shapes};
use glam::Vec3;
use log::debug;

/// How a command ended, mirroring the host's operator result.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Finished,
    Cancelled,
}

#[derive(Copy, Clone, Debug)]
pub struct SceneConfig {
    pub transfer_only_existing: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            transfer_only_existing: true,
        }
    }
}

/// A mesh object: its shape keys and the rig object deforming it.
#[derive(Clone, Debug, Default)]
pub struct MeshObject {
    pub shape_keys: Option<ShapeKeySet>,
    pub rig: Option<String>,
}

#[derive(Clone, Debug)]
pub enum ObjectData {
    Rig(Armature),
    Mesh(MeshObject),
    Empty,
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub translation: Vec3,
    pub data: ObjectData,
}

impl SceneObject {
    pub fn rig(name: &str, armature: Armature) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            translation: Vec3::ZERO,
            data: ObjectData::Rig(armature),
        }
    }

    pub fn mesh(name: &str, mesh: MeshObject) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            translation: Vec3::ZERO,
            data: ObjectData::Mesh(mesh),
        }
    }

    pub fn armature(&self) -> Option<&Armature> {
        match &self.data {
            ObjectData::Rig(armature) => Some(armature),
            _ => None,
        }
    }

    pub fn armature_mut(&mut self) -> Option<&mut Armature> {
        match &mut self.data {
            ObjectData::Rig(armature) => Some(armature),
            _ => None,
        }
    }

    pub fn shape_keys(&self) -> Option<&ShapeKeySet> {
        match &self.data {
            ObjectData::Mesh(mesh) => mesh.shape_keys.as_ref(),
            _ => None,
        }
    }
}

/// The command context: every object in the document, the active object, the
/// ordered selection and the scene-level configuration record.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub active: Option<String>,
    pub selected: Vec<String>,
    pub config: SceneConfig,
}

impl Scene {
    pub fn new() -> Scene {
        Scene::default()
    }

    /// Adds an object and makes it the active, sole-selected one.
    pub fn add_object(&mut self, object: SceneObject) {
        self.active = Some(object.name.clone());
        self.selected = vec![object.name.clone()];
        self.objects.push(object);
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    fn object_index(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name == name)
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.object(self.active.as_deref()?)
    }

    /// The active object's armature, when the active object is a rig.
    pub fn active_rig_mut(&mut self) -> Option<&mut Armature> {
        let name = self.active.clone()?;
        self.object_mut(&name)?.armature_mut()
    }

    /// A name no object in the scene carries yet, host-style (`Empty`,
    /// `Empty.001`, ...).
    fn unique_object_name(&self, base: &str) -> String {
        if self.object(base).is_none() {
            return base.to_string();
        }
        let mut counter = 1;
        loop {
            let candidate = format!("{base}.{counter:03}");
            if self.object(&candidate).is_none() {
                return candidate;
            }
            counter += 1;
        }
    }
}

pub type CommandFn = fn(&mut Scene) -> Result<Outcome, Error>;

/// The registered commands. Names match the host-side operator identifiers.
pub const COMMANDS: &[(&str, CommandFn)] = &[
    ("add_root_bone", cmd_add_root_bone),
    ("create_bone_groups", cmd_create_bone_groups),
    ("rig_arm", cmd_rig_arm),
    ("rig_leg", cmd_rig_leg),
    ("add_foot_rocker", cmd_add_foot_rocker),
    ("add_finger_controller", cmd_add_finger_controller),
    ("fix_hand_driver", cmd_fix_hand_driver),
    ("fix_foot_driver", cmd_fix_foot_driver),
    ("fix_shldr_driver", cmd_fix_shldr_driver),
    ("transfer_drivers", cmd_transfer_drivers),
    ("constraint_bone_to_empty", cmd_constraint_bone_to_empty),
    ("rename_bones", cmd_rename_bones),
    ("rename_bones_to_daz", cmd_rename_bones_to_daz),
    ("shape_spine_bones", cmd_shape_spine_bones),
    ("shape_arm_bones", cmd_shape_arm_bones),
    ("shape_leg_bones", cmd_shape_leg_bones),
    ("shape_finger_bones", cmd_shape_finger_bones),
];

/// Runs the named command against the scene.
pub fn dispatch(name: &str, scene: &mut Scene) -> Result<Outcome, Error> {
    let handler = COMMANDS
        .iter()
        .find(|(command, _)| *command == name)
        .map(|(_, handler)| handler)
        .ok_or_else(|| Error::UnknownCommand {
            name: name.to_string(),
        })?;
    debug!("dispatching command {name}");
    handler(scene)
}

fn cmd_add_root_bone(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    rig::add_root_bone(armature)?;
    Ok(Outcome::Finished)
}

fn cmd_create_bone_groups(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    rig::create_bone_groups(armature);
    Ok(Outcome::Finished)
}

fn cmd_rig_arm(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    armature.with_all_visible(rig::rig_arm)?;
    Ok(Outcome::Finished)
}

fn cmd_rig_leg(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    armature.with_all_visible(|armature| {
        rig::rig_leg(armature)?;
        rig::add_pole_constraint(
            armature,
            Vec3::new(0.0, 0.02, 0.0),
            LEG_BONES,
            LEG_POLE,
            LEG_CTRL,
            "Leg.pole.constraint",
        )
    })?;
    Ok(Outcome::Finished)
}

fn cmd_add_foot_rocker(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    armature.with_all_visible(rig::rig_foot_rocker)?;
    Ok(Outcome::Finished)
}

fn cmd_add_finger_controller(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    armature.with_all_visible(rig::add_finger_controller)?;
    Ok(Outcome::Finished)
}

fn cmd_fix_hand_driver(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    fix_hand_driver(armature)?;
    Ok(Outcome::Finished)
}

fn cmd_fix_foot_driver(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    fix_foot_driver(armature)?;
    Ok(Outcome::Finished)
}

fn cmd_fix_shldr_driver(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    fix_shldr_driver(armature)?;
    Ok(Outcome::Finished)
}

/// Copies shape-key drivers from the active object onto the other selected
/// object. Requires exactly two selected objects; checked before anything is
/// touched.
fn cmd_transfer_drivers(scene: &mut Scene) -> Result<Outcome, Error> {
    if scene.selected.len() != 2 {
        return Ok(Outcome::Cancelled);
    }
    let Some(active) = scene.active.clone() else {
        return Ok(Outcome::Cancelled);
    };
    let Some(dst_name) = scene
        .selected
        .iter()
        .find(|name| **name != active)
        .cloned()
    else {
        return Ok(Outcome::Cancelled);
    };
    let params = TransferParams {
        transfer_only_existing: scene.config.transfer_only_existing,
    };

    let src_index = scene
        .object_index(&active)
        .ok_or_else(|| Error::UnknownObject {
            name: active.clone(),
        })?;
    let dst_index = scene
        .object_index(&dst_name)
        .ok_or_else(|| Error::UnknownObject {
            name: dst_name.clone(),
        })?;

    // Resolve the destination's rig before borrowing the key sets.
    let dst_rig_name = match &scene.objects[dst_index].data {
        ObjectData::Mesh(mesh) => mesh.rig.clone().ok_or_else(|| Error::UnknownObject {
            name: format!("{dst_name} rig"),
        })?,
        _ => {
            return Err(Error::MissingShapeKeys {
                name: dst_name.clone(),
            });
        }
    };
    let dst_armature_name = scene
        .object(&dst_rig_name)
        .and_then(SceneObject::armature)
        .map(|armature| armature.name.clone())
        .ok_or_else(|| Error::UnknownObject {
            name: dst_rig_name.clone(),
        })?;

    let (src_object, dst_object) = pair_mut(&mut scene.objects, src_index, dst_index);
    let src_keys = match &src_object.data {
        ObjectData::Mesh(mesh) => mesh.shape_keys.as_ref().ok_or_else(|| {
            Error::MissingShapeKeys {
                name: active.clone(),
            }
        })?,
        _ => return Err(Error::MissingShapeKeys { name: active }),
    };
    let dst_keys = match &mut dst_object.data {
        ObjectData::Mesh(mesh) => {
            // The destination may not have carried drivers before; animation
            // data is created on demand.
            mesh.shape_keys
                .as_mut()
                .ok_or_else(|| Error::MissingShapeKeys {
                    name: dst_name.clone(),
                })?
        }
        _ => return Err(Error::MissingShapeKeys { name: dst_name }),
    };

    transfer_drivers(src_keys, dst_keys, &dst_rig_name, &dst_armature_name, params);
    Ok(Outcome::Finished)
}

/// Pins the active pose bone to a fresh empty placed at the bone's world
/// position.
fn cmd_constraint_bone_to_empty(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(active) = scene.active.clone() else {
        return Ok(Outcome::Cancelled);
    };
    let Some(object) = scene.object(&active) else {
        return Ok(Outcome::Cancelled);
    };
    let translation = object.translation;
    let Some(armature) = object.armature() else {
        return Ok(Outcome::Cancelled);
    };
    let Some(bone_name) = armature.active_bone().map(str::to_string) else {
        return Ok(Outcome::Cancelled);
    };
    let world = translation + armature.bone(&bone_name)?.head;

    let empty_name = scene.unique_object_name("Empty");
    scene.objects.push(SceneObject {
        name: empty_name.clone(),
        translation: world,
        data: ObjectData::Empty,
    });

    let armature = scene
        .object_mut(&active)
        .and_then(SceneObject::armature_mut)
        .ok_or(Error::UnknownObject { name: active })?;
    armature.enter(Mode::Object);
    armature.add_constraint(&bone_name, Constraint::copy_location_object(&empty_name))?;
    Ok(Outcome::Finished)
}

fn rename_all(armature: &mut Armature, rename: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
    let renames: Vec<(String, String)> = armature
        .bone_names()
        .into_iter()
        .filter_map(|name| rename(&name).map(|new| (name, new)))
        .collect();
    for (old, new) in renames {
        armature.rename_bone(&old, &new)?;
    }
    Ok(())
}

fn cmd_rename_bones(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    rename_all(armature, daz_to_suffix)?;
    Ok(Outcome::Finished)
}

fn cmd_rename_bones_to_daz(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    rename_all(armature, suffix_to_daz)?;
    Ok(Outcome::Finished)
}

fn cmd_shape_spine_bones(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    shapes::shape_spine_bones(armature)?;
    Ok(Outcome::Finished)
}

fn cmd_shape_arm_bones(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    shapes::shape_arm_bones(armature)?;
    // IK shapes only apply once the arm has been rigged.
    if let Err(e) = shapes::shape_arm_ik_bones(armature) {
        debug!("skipping arm IK shapes: {e}");
    }
    Ok(Outcome::Finished)
}

fn cmd_shape_leg_bones(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    shapes::shape_leg_bones(armature)?;
    shapes::colorize_toe_bones(armature)?;
    if let Err(e) = shapes::shape_leg_ik_bones(armature) {
        debug!("skipping leg IK shapes: {e}");
    }
    if let Err(e) = shapes::shape_foot_rocker(armature) {
        debug!("skipping rocker shapes: {e}");
    }
    Ok(Outcome::Finished)
}

fn cmd_shape_finger_bones(scene: &mut Scene) -> Result<Outcome, Error> {
    let Some(armature) = scene.active_rig_mut() else {
        return Ok(Outcome::Cancelled);
    };
    shapes::shape_finger_bones(armature)?;
    shapes::colorize_finger_bones(armature)?;
    Ok(Outcome::Finished)
}

/// Splits two distinct objects out of the scene list for a simultaneous
/// read/write borrow.
fn pair_mut(
    objects: &mut [SceneObject],
    first: usize,
    second: usize,
) -> (&mut SceneObject, &mut SceneObject) {
    assert_ne!(first, second);
    if first < second {
        let (head, tail) = objects.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = objects.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}
