//! Widget-shape and color assignment for the finished rig: spine shaping,
//! limb shapes and the finger/toe color buckets.

use crate::names::{
    ARM_BONES, ARM_POLE, COLLAR, FINGERS, FOOT_BONES, FOOT_ROCKER, HAND, HAND_CTRL, LEG_BONES,
    LEG_CTRL, LEG_POLE, PECTORAL, ROOT, SPINE_BONES, Side, TOE, TOES, groups, mch,
};
use crate::{Armature, Error, WidgetShape};

/// Spine shaping: shapes for the root, the spine column and the pectorals,
/// plus their group assignments.
pub fn shape_spine_bones(armature: &mut Armature) -> Result<(), Error> {
    armature.select_bone(ROOT, false)?;
    armature.set_selected_custom_shape(Some(WidgetShape::Root));

    let spine_shapes: [(usize, &str, WidgetShape); 6] = [
        (0, groups::CONTROLLERS, WidgetShape::Cube),
        (1, groups::FK_WITHOUT_IK, WidgetShape::FkLimb1),
        (2, groups::FK_WITHOUT_IK, WidgetShape::Torso),
        (3, groups::FK_WITHOUT_IK, WidgetShape::Plane),
        (4, groups::FK_WITHOUT_IK, WidgetShape::Circle),
        (5, groups::FK_WITHOUT_IK, WidgetShape::Chest),
    ];
    for (index, group, shape) in spine_shapes {
        armature.select_bone(SPINE_BONES[index], false)?;
        armature.assign_selected_to_bone_group(group);
        armature.set_selected_custom_shape(Some(shape));
    }
    armature.select_bone(SPINE_BONES[6], false)?;
    armature.select_bone(SPINE_BONES[7], true)?;
    armature.select_bone(SPINE_BONES[8], true)?;
    armature.assign_selected_to_bone_group(groups::FK_WITHOUT_IK);
    armature.set_selected_custom_shape(Some(WidgetShape::FkLimb1));

    for side in Side::BOTH {
        armature.select_bone(&side.apply(PECTORAL), false)?;
        armature.assign_selected_to_bone_group(groups::FK);
        armature.set_selected_custom_shape(Some(WidgetShape::PaddleRounded));
    }
    Ok(())
}

pub fn shape_arm_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        armature.select_bone(&side.apply(ARM_BONES[0]), false)?;
        armature.select_bone(&side.apply(ARM_BONES[2]), true)?;
        armature.set_selected_custom_shape(Some(WidgetShape::FkLimb2));
        armature.select_bone(&side.apply(ARM_BONES[1]), false)?;
        armature.select_bone(&side.apply(ARM_BONES[3]), true)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Roll1));
        armature.select_bone(&side.apply(HAND), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Sphere));
        armature.select_bone(&side.apply(COLLAR), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Clavicle));
    }
    Ok(())
}

/// Shapes for the arm IK bones; callers tolerate failure when the arm has not
/// been rigged yet.
pub fn shape_arm_ik_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        armature.select_bone(&side.apply(HAND_CTRL), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Cube));
        armature.select_bone(&side.apply(ARM_POLE), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Pyramid));
    }
    Ok(())
}

pub fn shape_leg_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        armature.select_bone(&side.apply(LEG_BONES[0]), false)?;
        armature.select_bone(&side.apply(LEG_BONES[2]), true)?;
        armature.select_bone(&side.apply(FOOT_BONES[1]), true)?;
        armature.set_selected_custom_shape(Some(WidgetShape::FkLimb2));
        armature.select_bone(&side.apply(LEG_BONES[1]), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Roll1));
        armature.deselect_all();
        for toe in TOES {
            armature.select_bone(&side.apply(toe), true)?;
            armature.select_bone(&side.apply(&format!("{toe}_2")), true)?;
        }
        armature.set_selected_custom_shape(Some(WidgetShape::Circle));
        armature.select_bone(&side.apply(FOOT_BONES[0]), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Sphere));
    }
    Ok(())
}

pub fn shape_leg_ik_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        armature.select_bone(&side.apply(LEG_CTRL), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Cube));
        armature.select_bone(&side.apply(LEG_POLE), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Rhomboid));
    }
    Ok(())
}

pub fn shape_foot_rocker(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        armature.select_bone(&side.apply(FOOT_ROCKER), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Chest));
        armature.select_bone(&side.apply(&mch(TOE)), false)?;
        armature.set_selected_custom_shape(Some(WidgetShape::Chest));
    }
    Ok(())
}

pub fn shape_finger_bones(armature: &mut Armature) -> Result<(), Error> {
    armature.deselect_all();
    for side in Side::BOTH {
        for finger in FINGERS {
            for segment in 1..=3 {
                armature.select_bone(&side.apply(&format!("{finger}{segment}")), true)?;
            }
        }
    }
    armature.set_selected_custom_shape(Some(WidgetShape::Circle));
    Ok(())
}

/// One group per finger so neighboring fingers read apart in the viewport.
const FINGER_COLOR_GROUPS: [&str; 5] = [
    groups::CONTROLLERS,
    groups::FK_WITHOUT_IK,
    groups::SHAPEKEY_CONTROLLERS,
    groups::FK,
    groups::POLES,
];

pub fn colorize_finger_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        for (finger, group) in FINGERS.iter().zip(FINGER_COLOR_GROUPS) {
            for segment in 1..=3 {
                armature.deselect_all();
                armature.select_bone(&side.apply(&format!("{finger}{segment}")), true)?;
                armature.assign_selected_to_bone_group(group);
            }
        }
    }
    Ok(())
}

pub fn colorize_toe_bones(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        for (toe, group) in TOES.iter().zip(FINGER_COLOR_GROUPS) {
            armature.select_bone(&side.apply(toe), false)?;
            armature.select_bone(&side.apply(&format!("{toe}_2")), true)?;
            armature.assign_selected_to_bone_group(group);
        }
    }
    Ok(())
}
