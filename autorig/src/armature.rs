//! The in-memory armature: a flat bone arena with name lookups, plus the
//! editing operations the rig builders are written against.
//!
//! Parents and constraint targets are stored as bone names and resolved
//! lazily, so the arena never holds cyclic references. Operations that need a
//! particular editing mode request the transition themselves, the way the
//! host's interactive helpers do.

use crate::{
    Bone, BoneGroup, ColorTheme, Constraint, ConstraintTarget, DriverGraph, Error, LayerMask, Mode,
    RotationMode, WidgetShape,
};
use glam::Vec3;
use log::warn;
use std::collections::HashMap;

/// Reference frame for extrusion/translation offsets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Orientation {
    Global,
    /// The source bone's local axes.
    Normal,
}

#[derive(Clone, Debug, Default)]
pub struct Armature {
    /// Data-block name (distinct from the scene object that carries it).
    pub name: String,
    bones: Vec<Bone>,
    index: HashMap<String, usize>,
    mode: Mode,
    visible: LayerMask,
    selected: Vec<String>,
    active: Option<String>,
    groups: Vec<BoneGroup>,
    /// Corrective drivers live on the armature data block.
    pub drivers: DriverGraph,
}

impl Armature {
    pub fn new(name: &str) -> Armature {
        Armature {
            name: name.to_string(),
            visible: LayerMask::default(),
            ..Armature::default()
        }
    }

    /// Builds an armature from pre-made bones, validating name uniqueness and
    /// parent references.
    pub fn from_bones(name: &str, bones: Vec<Bone>) -> Result<Armature, Error> {
        let mut armature = Armature::new(name);
        for bone in &bones {
            if let Some(parent) = &bone.parent {
                if !bones.iter().any(|b| &b.name == parent) {
                    return Err(Error::UnknownBone {
                        name: parent.clone(),
                    });
                }
            }
        }
        for bone in bones {
            armature.insert(bone)?;
        }
        Ok(armature)
    }

    fn insert(&mut self, bone: Bone) -> Result<usize, Error> {
        if self.index.contains_key(&bone.name) {
            return Err(Error::DuplicateBone { name: bone.name });
        }
        let idx = self.bones.len();
        self.index.insert(bone.name.clone(), idx);
        self.bones.push(bone);
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn has_bone(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn bone(&self, name: &str) -> Result<&Bone, Error> {
        self.index
            .get(name)
            .map(|&i| &self.bones[i])
            .ok_or_else(|| Error::UnknownBone {
                name: name.to_string(),
            })
    }

    pub fn bone_mut(&mut self, name: &str) -> Result<&mut Bone, Error> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.bones[i]),
            None => Err(Error::UnknownBone {
                name: name.to_string(),
            }),
        }
    }

    pub fn bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    pub fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    // ---- mode, selection, visibility ----

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Requests a mode transition and returns the mode that was active before.
    pub fn enter(&mut self, mode: Mode) -> Mode {
        std::mem::replace(&mut self.mode, mode)
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
        self.active = None;
    }

    pub fn select_bone(&mut self, name: &str, additive: bool) -> Result<(), Error> {
        if !self.has_bone(name) {
            return Err(Error::UnknownBone {
                name: name.to_string(),
            });
        }
        if !additive {
            self.deselect_all();
        }
        if !self.selected.iter().any(|s| s == name) {
            self.selected.push(name.to_string());
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn active_bone(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn visible_layers(&self) -> LayerMask {
        self.visible
    }

    pub fn set_visible_layers(&mut self, mask: LayerMask) {
        self.visible = mask;
    }

    /// Runs `f` with every layer visible, restoring the caller's visibility
    /// mask on both success and failure exits. Builders that touch hidden
    /// machinery bones must go through here so a mid-sequence error cannot
    /// leak a dirty mask into the document.
    pub fn with_all_visible<T>(
        &mut self,
        f: impl FnOnce(&mut Armature) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let saved = self.visible;
        self.visible = LayerMask::ALL;
        let result = f(self);
        self.visible = saved;
        result
    }

    // ---- structural edits ----

    /// Adds a primitive bone: head at the origin, unit tail up +Z.
    pub fn create_bone(&mut self, name: &str) -> Result<(), Error> {
        self.enter(Mode::Edit);
        self.insert(Bone::new(name, Vec3::ZERO, Vec3::Z))?;
        self.select_bone(name, false)
    }

    /// Duplicates a bone, geometry and constraints both; the copy never
    /// deforms and is disconnected from its source. Without an explicit
    /// parent the copy keeps the source's parent.
    pub fn duplicate_bone(
        &mut self,
        src: &str,
        new_name: &str,
        parent: Option<&str>,
        length: Option<f32>,
    ) -> Result<(), Error> {
        self.enter(Mode::Edit);
        if self.has_bone(new_name) {
            return Err(Error::DuplicateBone {
                name: new_name.to_string(),
            });
        }
        if let Some(parent) = parent {
            self.bone(parent)?;
        }
        let mut bone = self.bone(src)?.clone();
        bone.name = new_name.to_string();
        bone.deform = false;
        bone.connected = false;
        if let Some(parent) = parent {
            bone.parent = Some(parent.to_string());
        }
        if let Some(length) = length {
            bone.set_length(length);
        }
        self.insert(bone)?;
        self.select_bone(new_name, false)
    }

    /// Extrudes a new bone off the source's tip (tail, or head when
    /// `from_head`), offset in global or bone-local axes. The new bone never
    /// deforms, is disconnected, and is parented as given (`None` leaves it
    /// parentless).
    pub fn extrude_bone(
        &mut self,
        from: &str,
        offset: Vec3,
        new_name: &str,
        parent: Option<&str>,
        orientation: Orientation,
        from_head: bool,
    ) -> Result<(), Error> {
        self.enter(Mode::Edit);
        if self.has_bone(new_name) {
            return Err(Error::DuplicateBone {
                name: new_name.to_string(),
            });
        }
        if let Some(parent) = parent {
            self.bone(parent)?;
        }
        let src = self.bone(from)?;
        let base = if from_head { src.head } else { src.tail };
        let offset = match orientation {
            Orientation::Global => offset,
            Orientation::Normal => src.local_offset(offset),
        };
        let mut bone = Bone::new(new_name, base, base + offset);
        bone.roll = src.roll;
        bone.layers = src.layers;
        bone.deform = false;
        bone.parent = parent.map(str::to_string);
        self.insert(bone)?;
        self.select_bone(new_name, false)
    }

    /// Translates head and tail by a world-space offset.
    pub fn move_bone(&mut self, name: &str, offset: Vec3) -> Result<(), Error> {
        self.enter(Mode::Edit);
        let bone = self.bone_mut(name)?;
        bone.head += offset;
        bone.tail += offset;
        Ok(())
    }

    /// Translates head and tail by an offset in the bone's own axes.
    pub fn translate_local(&mut self, name: &str, offset: Vec3) -> Result<(), Error> {
        self.enter(Mode::Edit);
        let bone = self.bone_mut(name)?;
        let offset = bone.local_offset(offset);
        bone.head += offset;
        bone.tail += offset;
        Ok(())
    }

    /// Snaps a bone onto another bone's tip, preserving the moved bone's
    /// vector: the head lands on the target's tail (or head, with
    /// `target_head`) and the tail follows. With `from_head` the vector is
    /// reversed so the bone points back the way it came.
    pub fn snap_to_bone(
        &mut self,
        name: &str,
        target: &str,
        target_head: bool,
        from_head: bool,
    ) -> Result<(), Error> {
        self.enter(Mode::Edit);
        let target = self.bone(target)?;
        let point = if target_head {
            target.head
        } else {
            target.tail
        };
        let bone = self.bone_mut(name)?;
        let vector = bone.vector();
        bone.head = point;
        bone.tail = if from_head {
            point - vector
        } else {
            point + vector
        };
        Ok(())
    }

    pub fn set_parent(&mut self, name: &str, parent: Option<&str>) -> Result<(), Error> {
        self.enter(Mode::Edit);
        if let Some(parent) = parent {
            self.bone(parent)?;
        }
        self.bone_mut(name)?.parent = parent.map(str::to_string);
        Ok(())
    }

    pub fn set_length(&mut self, name: &str, length: f32) -> Result<(), Error> {
        self.enter(Mode::Edit);
        self.bone_mut(name)?.set_length(length);
        Ok(())
    }

    pub fn set_roll(&mut self, name: &str, roll: f32) -> Result<(), Error> {
        self.enter(Mode::Edit);
        self.bone_mut(name)?.roll = roll;
        Ok(())
    }

    pub fn set_layers(&mut self, name: &str, layers: LayerMask) -> Result<(), Error> {
        self.bone_mut(name)?.layers = layers;
        Ok(())
    }

    /// Renames a bone and patches every name reference to it: parents,
    /// constraint bone targets, selection state.
    pub fn rename_bone(&mut self, old: &str, new: &str) -> Result<(), Error> {
        if old == new {
            return Ok(());
        }
        if self.has_bone(new) {
            return Err(Error::DuplicateBone {
                name: new.to_string(),
            });
        }
        let idx = *self.index.get(old).ok_or_else(|| Error::UnknownBone {
            name: old.to_string(),
        })?;
        self.index.remove(old);
        self.index.insert(new.to_string(), idx);
        self.bones[idx].name = new.to_string();
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(old) {
                bone.parent = Some(new.to_string());
            }
            for constraint in &mut bone.constraints {
                retarget_constraint(constraint, old, new);
            }
        }
        for name in &mut self.selected {
            if name == old {
                *name = new.to_string();
            }
        }
        if self.active.as_deref() == Some(old) {
            self.active = Some(new.to_string());
        }
        Ok(())
    }

    // ---- pose-level edits ----

    pub fn add_constraint(&mut self, bone: &str, constraint: Constraint) -> Result<(), Error> {
        self.enter(Mode::Pose);
        self.select_bone(bone, false)?;
        self.bone_mut(bone)?.constraints.push(constraint);
        Ok(())
    }

    pub fn constraint_mut(&mut self, bone: &str, name: &str) -> Result<&mut Constraint, Error> {
        let bone_name = bone.to_string();
        self.bone_mut(bone)?
            .constraint_mut(name)
            .ok_or(Error::UnknownConstraint {
                bone: bone_name,
                name: name.to_string(),
            })
    }

    pub fn remove_constraint(&mut self, bone: &str, name: &str) -> Result<(), Error> {
        self.enter(Mode::Pose);
        let b = self.bone_mut(bone)?;
        match b.constraints.iter().position(|c| c.name == name) {
            Some(i) => {
                b.constraints.remove(i);
                Ok(())
            }
            None => Err(Error::UnknownConstraint {
                bone: bone.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Idempotent removal: a constraint that is already absent is logged and
    /// treated as success (first runs never have the host's imported limits).
    pub fn ensure_constraint_absent(&mut self, bone: &str, name: &str) -> Result<(), Error> {
        match self.remove_constraint(bone, name) {
            Ok(()) => Ok(()),
            Err(Error::UnknownConstraint { bone, name }) => {
                warn!("constraint {name} on bone {bone} not found");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Reorders a constraint within its bone's evaluation list.
    pub fn move_constraint_to_index(
        &mut self,
        bone: &str,
        name: &str,
        index: usize,
    ) -> Result<(), Error> {
        self.enter(Mode::Pose);
        let b = self.bone_mut(bone)?;
        let from = b
            .constraints
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::UnknownConstraint {
                bone: bone.to_string(),
                name: name.to_string(),
            })?;
        let constraint = b.constraints.remove(from);
        let index = index.min(b.constraints.len());
        b.constraints.insert(index, constraint);
        Ok(())
    }

    /// Locks the bone's IK-solver rotation per axis.
    pub fn lock_ik(&mut self, bone: &str, x: bool, y: bool, z: bool) -> Result<(), Error> {
        self.enter(Mode::Pose);
        self.select_bone(bone, false)?;
        self.bone_mut(bone)?.lock_ik = [x, y, z];
        Ok(())
    }

    pub fn set_custom_shape(&mut self, bone: &str, shape: Option<WidgetShape>) -> Result<(), Error> {
        self.enter(Mode::Pose);
        self.bone_mut(bone)?.custom_shape = shape;
        Ok(())
    }

    /// Assigns a widget shape to every selected bone.
    pub fn set_selected_custom_shape(&mut self, shape: Option<WidgetShape>) {
        self.enter(Mode::Pose);
        let selected = self.selected.clone();
        for name in selected {
            if let Some(&i) = self.index.get(&name) {
                self.bones[i].custom_shape = shape;
            }
        }
    }

    pub fn set_rotation_mode_all(&mut self, mode: RotationMode) {
        self.enter(Mode::Pose);
        for bone in &mut self.bones {
            bone.rotation_mode = mode;
        }
    }

    // ---- bone groups ----

    pub fn bone_groups(&self) -> &[BoneGroup] {
        &self.groups
    }

    /// Looks the group up by name, creating it when missing; a second call
    /// with the same name only refreshes the color.
    pub fn create_or_get_bone_group(&mut self, name: &str, theme: ColorTheme) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.name == name) {
            group.theme = theme;
            return;
        }
        self.groups.push(BoneGroup {
            name: name.to_string(),
            theme,
        });
    }

    /// Puts every selected bone in the named group. An unknown group name is
    /// a caller bug, not a runtime fault: logged and ignored.
    pub fn assign_selected_to_bone_group(&mut self, name: &str) {
        if !self.groups.iter().any(|g| g.name == name) {
            warn!("bone group with name {name} not found");
            return;
        }
        let selected = self.selected.clone();
        for bone in selected {
            if let Some(&i) = self.index.get(&bone) {
                self.bones[i].group = Some(name.to_string());
            }
        }
    }
}

fn retarget_constraint(constraint: &mut Constraint, old: &str, new: &str) {
    use crate::ConstraintKind::*;
    let patch = |target: &mut ConstraintTarget| {
        if let ConstraintTarget::Bone(name) = target {
            if name == old {
                *name = new.to_string();
            }
        }
    };
    match &mut constraint.kind {
        Ik {
            target, pole_target, ..
        } => {
            if let Some(target) = target {
                patch(target);
            }
            if let Some(pole) = pole_target {
                patch(pole);
            }
        }
        CopyRotation { target, .. }
        | CopyTransforms { target, .. }
        | CopyLocation { target }
        | DampedTrack { target }
        | LockedTrack { target, .. }
        | Transformation { target, .. } => patch(target),
        LimitRotation { .. } | LimitLocation { .. } => {}
    }
}
