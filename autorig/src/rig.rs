//! The ordered rig-construction procedures: root bone, limb IK, the foot
//! rocker network and the finger controller network.
//!
//! Every builder is a fixed sequence over both sides; later steps reference
//! bones created by earlier steps, so the order is load-bearing throughout.

use crate::names::{
    ARM_BONES, ARM_POLE, COLLAR, FINGER_CTRL, FINGERS, FOOT, FOOT_ROCKER, HAND, HAND_CTRL, HIP,
    LEG_BONES, LEG_CTRL, LEG_POLE, METATARSALS, ROOT, Side, TOE, groups, mch,
};
use crate::{
    Armature, Axes, ColorTheme, Constraint, ConstraintKind, ConstraintTarget, Error, LayerMask,
    MixMode, Mode, Orientation, RotationMode, Space,
};
use glam::Vec3;
use log::debug;

/// Layer hiding the rocker machinery; the toe mechanism bone stays reachable
/// on layer 1 because animators keyframe it directly.
const ROCKER_MCH_LAYER: u32 = 29;
const TOE_MCH_LAYER: u32 = 1;

const GROUND_LEVEL: f32 = 0.015;
const ROCKER_BONE_LEN: f32 = 0.03;

pub const GRAB_CONSTRAINT: &str = "Grab";
pub const CLENCH_CONSTRAINT: &str = "Clench";

/// Creates the five color-coded bone groups. Idempotent: a re-run only
/// refreshes colors.
pub fn create_bone_groups(armature: &mut Armature) {
    armature.create_or_get_bone_group(groups::CONTROLLERS, ColorTheme::Theme03);
    armature.create_or_get_bone_group(groups::POLES, ColorTheme::Theme06);
    armature.create_or_get_bone_group(groups::FK, ColorTheme::Theme09);
    armature.create_or_get_bone_group(groups::SHAPEKEY_CONTROLLERS, ColorTheme::Theme01);
    armature.create_or_get_bone_group(groups::FK_WITHOUT_IK, ColorTheme::Theme04);
}

/// Adds the root bone, parents the hip to it and switches every bone to
/// Euler XYZ rotation.
pub fn add_root_bone(armature: &mut Armature) -> Result<(), Error> {
    let prior = armature.mode();
    armature.create_bone(ROOT)?;
    armature.set_parent(HIP, Some(ROOT))?;
    armature.set_length(ROOT, 0.3)?;
    armature.enter(Mode::Pose);
    armature.select_bone(ROOT, false)?;
    armature.assign_selected_to_bone_group(groups::CONTROLLERS);
    armature.set_rotation_mode_all(RotationMode::EulerXyz);
    if prior == Mode::Object {
        armature.enter(Mode::Pose);
    } else {
        armature.enter(Mode::Edit);
    }
    Ok(())
}

/// Rigs both arms: hand controller, pole, a 4-bone IK chain and FK group
/// bookkeeping.
pub fn rig_arm(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        debug!("rigging arm {side:?}");
        let hand = side.apply(HAND);
        let hand_ctrl = side.apply(HAND_CTRL);
        armature.duplicate_bone(&hand, &hand_ctrl, Some(ROOT), Some(0.1))?;
        armature.snap_to_bone(&hand_ctrl, &side.apply(ARM_BONES[3]), false, false)?;
        armature.enter(Mode::Pose);
        armature.select_bone(&hand_ctrl, false)?;
        armature.bone_mut(&hand_ctrl)?.lock_location = [false; 3];
        armature.ensure_constraint_absent(&hand_ctrl, "Limit Rotation")?;
        armature.assign_selected_to_bone_group(groups::CONTROLLERS);

        armature.select_bone(&hand, false)?;
        armature.bone_mut(&hand)?.inherit_rotation = false;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.add_constraint(&hand, Constraint::copy_rotation(&hand_ctrl, Axes::ALL))?;

        let arm_pole = side.apply(ARM_POLE);
        armature.extrude_bone(
            &side.apply(ARM_BONES[1]),
            Vec3::new(0.0, 0.02, 0.0),
            &arm_pole,
            Some(ROOT),
            Orientation::Global,
            false,
        )?;
        armature.move_bone(&arm_pole, Vec3::new(0.0, 0.2, 0.0))?;
        armature.enter(Mode::Pose);
        armature.select_bone(&arm_pole, false)?;
        armature.assign_selected_to_bone_group(groups::POLES);

        armature.add_constraint(
            &side.apply(ARM_BONES[3]),
            Constraint::ik(4, &hand_ctrl, Some(&arm_pole), -90.0),
        )?;
        // Twist bones may only rotate about their own axis under IK.
        armature.lock_ik(&side.apply(ARM_BONES[1]), true, false, true)?;
        armature.lock_ik(&side.apply(ARM_BONES[3]), true, false, true)?;

        armature.select_bone(&side.apply(ARM_BONES[0]), false)?;
        armature.select_bone(&side.apply(ARM_BONES[2]), true)?;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.select_bone(&side.apply(ARM_BONES[1]), false)?;
        armature.select_bone(&side.apply(ARM_BONES[3]), true)?;
        armature.select_bone(&side.apply(COLLAR), true)?;
        armature.assign_selected_to_bone_group(groups::FK_WITHOUT_IK);
    }
    Ok(())
}

/// Rigs both legs: foot controller, pole, a 3-bone IK chain and FK group
/// bookkeeping.
pub fn rig_leg(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        debug!("rigging leg {side:?}");
        let shin = side.apply(LEG_BONES[2]);
        let leg_ctrl = side.apply(LEG_CTRL);
        armature.extrude_bone(
            &shin,
            Vec3::new(0.0, -0.1, 0.0),
            &leg_ctrl,
            Some(ROOT),
            Orientation::Global,
            false,
        )?;
        armature.snap_to_bone(&leg_ctrl, &shin, false, false)?;
        let roll = match side {
            Side::Left => 180f32.to_radians(),
            Side::Right => (-180f32).to_radians(),
        };
        armature.set_roll(&leg_ctrl, roll)?;
        armature.enter(Mode::Pose);
        armature.select_bone(&leg_ctrl, false)?;
        armature.ensure_constraint_absent(&leg_ctrl, "Limit Rotation")?;
        armature.assign_selected_to_bone_group(groups::CONTROLLERS);

        let foot = side.apply(FOOT);
        armature.select_bone(&foot, false)?;
        armature.bone_mut(&foot)?.inherit_rotation = false;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.add_constraint(&foot, Constraint::copy_rotation(&leg_ctrl, Axes::ALL))?;

        let leg_pole = side.apply(LEG_POLE);
        armature.extrude_bone(
            &side.apply(LEG_BONES[1]),
            Vec3::new(0.0, 0.02, 0.0),
            &leg_pole,
            Some(ROOT),
            Orientation::Global,
            false,
        )?;
        armature.move_bone(&leg_pole, Vec3::new(0.0, -0.4, 0.0))?;
        armature.enter(Mode::Pose);
        armature.select_bone(&leg_pole, false)?;
        armature.assign_selected_to_bone_group(groups::POLES);

        armature.add_constraint(&shin, Constraint::ik(3, &leg_ctrl, Some(&leg_pole), -90.0))?;
        armature.lock_ik(&side.apply(LEG_BONES[1]), true, false, true)?;

        armature.select_bone(&side.apply(LEG_BONES[0]), false)?;
        armature.select_bone(&shin, true)?;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.select_bone(&side.apply(LEG_BONES[1]), false)?;
        armature.assign_selected_to_bone_group(groups::FK_WITHOUT_IK);
    }
    Ok(())
}

/// Builds the three-bone helper network that keeps an IK chain from flipping
/// around its pole: two anchors follow the chain's root and tip, a middle
/// bone blends between them and tracks the controller, and the pole rides the
/// middle bone.
pub fn add_pole_constraint(
    armature: &mut Armature,
    extrude_vec: Vec3,
    chain: [&str; 3],
    pole: &str,
    controller: &str,
    name: &str,
) -> Result<(), Error> {
    for side in Side::BOTH {
        let first = side.apply(chain[0]);
        let first_parent = armature
            .bone(&first)?
            .parent
            .clone()
            .ok_or_else(|| Error::MissingParent {
                bone: first.clone(),
            })?;
        let anchor_root = format!("{name}.1{}", side.suffix());
        let blend = format!("{name}.2{}", side.suffix());
        let anchor_tip = format!("{name}.3{}", side.suffix());
        armature.extrude_bone(
            &first,
            extrude_vec,
            &anchor_root,
            Some(&first_parent),
            Orientation::Normal,
            true,
        )?;
        armature.extrude_bone(
            &side.apply(chain[1]),
            extrude_vec,
            &blend,
            None,
            Orientation::Normal,
            false,
        )?;
        armature.extrude_bone(
            &side.apply(chain[2]),
            extrude_vec,
            &anchor_tip,
            Some(&side.apply(controller)),
            Orientation::Normal,
            false,
        )?;
        armature.add_constraint(&blend, Constraint::copy_transforms(&anchor_root, 1.0))?;
        armature.add_constraint(&blend, Constraint::copy_transforms(&anchor_tip, 0.5))?;
        armature.add_constraint(&blend, Constraint::damped_track(&side.apply(controller)))?;
        armature.set_parent(&side.apply(pole), Some(&blend))?;
    }
    Ok(())
}

/// Builds the foot rocker: six hidden mechanism bones per side whose
/// limit-rotation ranges partition the visible rocker bone's rotation into
/// heel-pivot, toe-pivot and side-pivot bands.
pub fn rig_foot_rocker(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        debug!("building foot rocker {side:?}");
        let mirror = match side {
            Side::Left => 1.0,
            Side::Right => -1.0,
        };
        let heel_head = Vec3::new(mirror * 0.2, 0.1, GROUND_LEVEL);
        let heel_tail = Vec3::new(mirror * 0.195, 0.13, GROUND_LEVEL);
        let leg_ctrl = side.apply(LEG_CTRL);

        armature.deselect_all();

        // Pivots under the inner and outer heel edge, then the heel itself.
        let roll_side_left = side.apply(&mch(&Side::Left.apply(&format!("{FOOT}.Roll.side"))));
        armature.create_bone(&roll_side_left)?;
        {
            let bone = armature.bone_mut(&roll_side_left)?;
            bone.head = heel_head;
            bone.tail = heel_tail;
            bone.deform = false;
        }
        armature.set_parent(&roll_side_left, Some(&leg_ctrl))?;
        armature.translate_local(&roll_side_left, Vec3::new(0.025, 0.0, 0.0))?;
        armature.set_roll(&roll_side_left, 0.0)?;
        armature.set_layers(&roll_side_left, LayerMask::single(ROCKER_MCH_LAYER))?;

        let roll_side_right =
            side.apply(&mch(&Side::Right.apply(&format!("{FOOT}.Roll.side"))));
        armature.duplicate_bone(&roll_side_left, &roll_side_right, Some(&roll_side_left), None)?;
        armature.translate_local(&roll_side_right, Vec3::new(-0.05, 0.0, 0.0))?;
        armature.set_roll(&roll_side_right, 0.0)?;
        armature.set_layers(&roll_side_right, LayerMask::single(ROCKER_MCH_LAYER))?;

        let roll_heel = side.apply(&mch(&format!("{FOOT}.Roll.Heel")));
        armature.duplicate_bone(&roll_side_left, &roll_heel, Some(&roll_side_right), None)?;
        armature.translate_local(&roll_heel, Vec3::new(-0.025, 0.0, 0.0))?;
        armature.set_roll(&roll_heel, 0.0)?;
        armature.set_layers(&roll_heel, LayerMask::single(ROCKER_MCH_LAYER))?;

        // Toe pivot: a short bone at the toe head, flattened onto the ground
        // plane and pointing back at the heel.
        let toe = side.apply(TOE);
        let foot_roll = side.apply(&mch(&format!("{FOOT}.Roll")));
        armature.duplicate_bone(&toe, &foot_roll, Some(&roll_heel), Some(ROCKER_BONE_LEN))?;
        armature.snap_to_bone(&foot_roll, &toe, true, true)?;
        {
            let bone = armature.bone_mut(&foot_roll)?;
            bone.tail.z = bone.head.z;
            bone.deform = false;
            bone.roll = 0.0;
        }
        armature.set_custom_shape(&foot_roll, None)?;
        armature.set_layers(&foot_roll, LayerMask::single(ROCKER_MCH_LAYER))?;

        // Mechanism copies of the deforming foot chain.
        let foot = side.apply(FOOT);
        let foot_mch = side.apply(&mch(FOOT));
        armature.duplicate_bone(&foot, &foot_mch, Some(&foot_roll), None)?;
        armature.snap_to_bone(&foot_mch, &side.apply(LEG_BONES[2]), false, false)?;
        armature.select_bone(&foot_mch, false)?;
        {
            let bone = armature.bone_mut(&foot_mch)?;
            bone.deform = false;
            bone.inherit_rotation = true;
        }
        armature.set_custom_shape(&foot_mch, None)?;
        armature.assign_selected_to_bone_group(groups::FK_WITHOUT_IK);
        armature.ensure_constraint_absent(&foot_mch, "Copy Rotation")?;
        armature.set_layers(&foot_mch, LayerMask::single(ROCKER_MCH_LAYER))?;

        let metatarsals = side.apply(METATARSALS);
        let metatarsals_mch = side.apply(&mch(METATARSALS));
        armature.duplicate_bone(&metatarsals, &metatarsals_mch, None, None)?;
        armature.select_bone(&metatarsals_mch, false)?;
        armature.bone_mut(&metatarsals_mch)?.deform = false;
        armature.set_custom_shape(&metatarsals_mch, None)?;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.set_layers(&metatarsals_mch, LayerMask::single(ROCKER_MCH_LAYER))?;

        let toe_mch = side.apply(&mch(TOE));
        armature.duplicate_bone(&toe, &toe_mch, Some(&roll_heel), None)?;
        armature.select_bone(&toe_mch, false)?;
        armature.assign_selected_to_bone_group(groups::SHAPEKEY_CONTROLLERS);
        armature.bone_mut(&toe_mch)?.deform = false;
        armature.set_layers(&toe_mch, LayerMask::single(TOE_MCH_LAYER))?;

        // The one visible control the animator rocks.
        let rocker = side.apply(FOOT_ROCKER);
        armature.extrude_bone(
            &foot,
            Vec3::new(0.0, ROCKER_BONE_LEN, 0.0),
            &rocker,
            Some(&leg_ctrl),
            Orientation::Global,
            true,
        )?;
        armature.enter(Mode::Pose);
        armature.select_bone(&rocker, false)?;
        armature.assign_selected_to_bone_group(groups::SHAPEKEY_CONTROLLERS);

        // Each pivot copies the rocker on one axis and clamps to its own
        // half-range; the four ranges are disjoint so the rocker's motion
        // maps monotonically without double-counting.
        armature.add_constraint(
            &roll_side_left,
            Constraint::copy_rotation_spaces(&rocker, Axes::Y, MixMode::Replace, Space::Local, Space::Local),
        )?;
        armature.add_constraint(
            &roll_side_left,
            Constraint::limit_rotation(Axes::Y, Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 180.0, 0.0)),
        )?;

        armature.add_constraint(
            &roll_side_right,
            Constraint::copy_rotation_spaces(&rocker, Axes::Y, MixMode::Replace, Space::Local, Space::Local),
        )?;
        armature.add_constraint(
            &roll_side_right,
            Constraint::limit_rotation(Axes::Y, Vec3::new(0.0, -180.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
        )?;

        armature.add_constraint(
            &roll_heel,
            Constraint::copy_rotation_spaces(&rocker, Axes::X, MixMode::Replace, Space::Local, Space::Local),
        )?;
        armature.add_constraint(
            &roll_heel,
            Constraint::limit_rotation(Axes::X, Vec3::new(-180.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0)),
        )?;

        armature.add_constraint(
            &foot_roll,
            Constraint::copy_rotation_spaces(&rocker, Axes::X, MixMode::Replace, Space::Local, Space::Local),
        )?;
        armature.add_constraint(
            &foot_roll,
            Constraint::limit_rotation(Axes::X, Vec3::new(0.0, 0.0, 0.0), Vec3::new(180.0, 0.0, 0.0)),
        )?;

        // The deforming chain follows its mechanism copies in world space.
        armature.add_constraint(
            &toe,
            Constraint::copy_rotation_spaces(&toe_mch, Axes::ALL, MixMode::Replace, Space::World, Space::World),
        )?;
        armature.add_constraint(
            &metatarsals,
            Constraint::copy_rotation_spaces(&metatarsals_mch, Axes::ALL, MixMode::Replace, Space::World, Space::World),
        )?;
        armature.add_constraint(
            &foot,
            Constraint::copy_rotation_spaces(&foot_mch, Axes::ALL, MixMode::Replace, Space::World, Space::World),
        )?;

        // Deformation must follow the rocker chain, not the raw foot.
        retarget_shin_ik(armature, &side.apply(LEG_BONES[2]), &foot_mch)?;
    }
    Ok(())
}

/// Points the shin's IK constraint at the foot mechanism bone.
fn retarget_shin_ik(armature: &mut Armature, shin: &str, foot_mch: &str) -> Result<(), Error> {
    armature.enter(Mode::Pose);
    armature.select_bone(shin, false)?;
    let bone = armature.bone_mut(shin)?;
    let constraint = bone
        .constraints
        .iter_mut()
        .rev()
        .find(|c| matches!(c.kind, ConstraintKind::Ik { .. }))
        .ok_or_else(|| Error::UnknownConstraint {
            bone: shin.to_string(),
            name: "IK".to_string(),
        })?;
    if let ConstraintKind::Ik { target, .. } = &mut constraint.kind {
        *target = Some(ConstraintTarget::Bone(foot_mch.to_string()));
    }
    Ok(())
}

/// Adds the one-bone finger controller: rotating it curls every non-thumb
/// finger (grab), translating it down clenches the fist.
pub fn add_finger_controller(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        let hand = side.apply(HAND);
        let finger_ctrl = side.apply(FINGER_CTRL);
        armature.extrude_bone(
            &hand,
            Vec3::new(0.0, 0.1, 0.0),
            &finger_ctrl,
            Some(&hand),
            Orientation::Normal,
            false,
        )?;
        let roll = match side {
            Side::Left => (-130f32).to_radians(),
            Side::Right => 130f32.to_radians(),
        };
        armature.set_roll(&finger_ctrl, roll)?;
        armature.enter(Mode::Pose);
        armature.select_bone(&finger_ctrl, false)?;
        {
            let bone = armature.bone_mut(&finger_ctrl)?;
            bone.lock_location[0] = true;
            bone.lock_location[2] = true;
        }
        armature.assign_selected_to_bone_group(groups::SHAPEKEY_CONTROLLERS);
        armature.add_constraint(
            &finger_ctrl,
            Constraint::limit_rotation(
                Axes::ALL,
                Vec3::new(-50.0, -5.0, -18.0),
                Vec3::new(110.0, 5.0, 18.0),
            ),
        )?;
        armature.add_constraint(
            &finger_ctrl,
            Constraint::limit_location([None, Some(-0.1), None], [None, Some(0.0), None]),
        )?;

        for finger in &FINGERS[1..] {
            for segment in 1..=3 {
                let bone = side.apply(&format!("{finger}{segment}"));
                let axes = if segment > 1 { Axes::X } else { Axes::ALL };
                if segment < 3 {
                    armature.add_constraint(
                        &bone,
                        Constraint::copy_rotation_spaces(
                            &finger_ctrl,
                            axes,
                            MixMode::Add,
                            Space::Local,
                            Space::Local,
                        )
                        .with_name(GRAB_CONSTRAINT),
                    )?;
                }
                armature.add_constraint(
                    &bone,
                    Constraint::transformation(&finger_ctrl, -0.1, 90.0)
                        .with_name(CLENCH_CONSTRAINT),
                )?;
                // Clench must evaluate ahead of grab.
                if segment < 3 {
                    armature.move_constraint_to_index(&bone, GRAB_CONSTRAINT, 0)?;
                }
                armature.move_constraint_to_index(&bone, CLENCH_CONSTRAINT, 0)?;
            }
        }
    }
    Ok(())
}
