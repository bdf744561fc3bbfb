use crate::fixtures::{assert_approx, humanoid};
use crate::names::{ARM_BONES, LEG_BONES, LEG_CTRL, LEG_POLE, Side, groups};
use crate::{
    Armature, Axes, ConstraintKind, ConstraintTarget, MixMode, Mode, RotationMode, rig,
};
use glam::Vec3;

fn rigged_arms() -> Armature {
    let mut armature = humanoid();
    rig::create_bone_groups(&mut armature);
    rig::add_root_bone(&mut armature).unwrap();
    rig::rig_arm(&mut armature).unwrap();
    armature
}

fn rigged_legs() -> Armature {
    let mut armature = humanoid();
    rig::create_bone_groups(&mut armature);
    rig::add_root_bone(&mut armature).unwrap();
    rig::rig_leg(&mut armature).unwrap();
    armature
}

#[test]
fn root_bone_setup() {
    let mut armature = humanoid();
    rig::create_bone_groups(&mut armature);
    armature.enter(Mode::Object);
    rig::add_root_bone(&mut armature).unwrap();

    let root = armature.bone("Root").unwrap();
    assert_approx(root.length(), 0.3);
    assert_eq!(root.group.as_deref(), Some(groups::CONTROLLERS));
    assert_eq!(armature.bone("hip").unwrap().parent.as_deref(), Some("Root"));
    assert!(
        armature
            .bones()
            .all(|b| b.rotation_mode == RotationMode::EulerXyz)
    );
    // Starting from object mode lands the user in pose mode.
    assert_eq!(armature.mode(), Mode::Pose);
}

#[test]
fn arm_ik_chain_parameters() {
    let armature = rigged_arms();
    for side in Side::BOTH {
        let forearm = armature.bone(&side.apply(ARM_BONES[3])).unwrap();
        let ik: Vec<_> = forearm
            .constraints
            .iter()
            .filter(|c| matches!(c.kind, ConstraintKind::Ik { .. }))
            .collect();
        assert_eq!(ik.len(), 1);
        let ConstraintKind::Ik {
            chain_count,
            target,
            pole_target,
            pole_angle_deg,
        } = &ik[0].kind
        else {
            unreachable!()
        };
        assert_eq!(*chain_count, 4);
        assert_eq!(
            target.as_ref(),
            Some(&ConstraintTarget::Bone(side.apply("Hand.controller")))
        );
        assert_eq!(
            pole_target.as_ref(),
            Some(&ConstraintTarget::Bone(side.apply("Arm.pole")))
        );
        assert_approx(*pole_angle_deg, -90.0);
    }
}

#[test]
fn hand_controller_setup() {
    let armature = rigged_arms();
    for side in Side::BOTH {
        let ctrl = armature.bone(&side.apply("Hand.controller")).unwrap();
        assert_eq!(ctrl.parent.as_deref(), Some("Root"));
        assert!(!ctrl.deform);
        assert_approx(ctrl.length(), 0.1);
        assert_eq!(ctrl.group.as_deref(), Some(groups::CONTROLLERS));
        // Snapped onto the wrist joint.
        let wrist = armature.bone(&side.apply(ARM_BONES[3])).unwrap();
        assert_eq!(ctrl.head, wrist.tail);

        let hand = armature.bone(&side.apply("Hand")).unwrap();
        assert!(!hand.inherit_rotation);
        assert_eq!(hand.group.as_deref(), Some(groups::FK));
        let copy = hand.constraint("Copy Rotation").unwrap();
        let ConstraintKind::CopyRotation { target, axes, .. } = &copy.kind else {
            unreachable!()
        };
        assert_eq!(*target, ConstraintTarget::Bone(side.apply("Hand.controller")));
        assert_eq!(*axes, Axes::ALL);
    }
}

#[test]
fn arm_pole_offset_and_groups() {
    let armature = rigged_arms();
    for side in Side::BOTH {
        let shldr_twist = armature.bone(&side.apply(ARM_BONES[1])).unwrap();
        let pole = armature.bone(&side.apply("Arm.pole")).unwrap();
        // Extruded 0.02 off the twist tail, then pushed 0.2 further out.
        assert_eq!(pole.head, shldr_twist.tail + Vec3::new(0.0, 0.2, 0.0));
        assert_eq!(pole.group.as_deref(), Some(groups::POLES));

        // Twist bones keep only their own axis free under IK.
        assert_eq!(shldr_twist.lock_ik, [true, false, true]);
        assert_eq!(
            armature.bone(&side.apply(ARM_BONES[3])).unwrap().lock_ik,
            [true, false, true]
        );

        assert_eq!(
            armature.bone(&side.apply(ARM_BONES[0])).unwrap().group.as_deref(),
            Some(groups::FK)
        );
        assert_eq!(
            armature.bone(&side.apply(ARM_BONES[1])).unwrap().group.as_deref(),
            Some(groups::FK_WITHOUT_IK)
        );
        assert_eq!(
            armature.bone(&side.apply("Collar")).unwrap().group.as_deref(),
            Some(groups::FK_WITHOUT_IK)
        );
    }
}

#[test]
fn leg_ik_chain_parameters() {
    let armature = rigged_legs();
    for side in Side::BOTH {
        let shin = armature.bone(&side.apply(LEG_BONES[2])).unwrap();
        let ik = shin.constraint("IK").unwrap();
        let ConstraintKind::Ik {
            chain_count,
            target,
            pole_target,
            pole_angle_deg,
        } = &ik.kind
        else {
            unreachable!()
        };
        assert_eq!(*chain_count, 3);
        assert_eq!(
            target.as_ref(),
            Some(&ConstraintTarget::Bone(side.apply(LEG_CTRL)))
        );
        assert_eq!(
            pole_target.as_ref(),
            Some(&ConstraintTarget::Bone(side.apply(LEG_POLE)))
        );
        assert_approx(*pole_angle_deg, -90.0);

        let ctrl = armature.bone(&side.apply(LEG_CTRL)).unwrap();
        let expected_roll = match side {
            Side::Left => 180f32.to_radians(),
            Side::Right => (-180f32).to_radians(),
        };
        assert_approx(ctrl.roll, expected_roll);

        // The pole sits behind the knee, not in front of it.
        let thigh_twist = armature.bone(&side.apply(LEG_BONES[1])).unwrap();
        let pole = armature.bone(&side.apply(LEG_POLE)).unwrap();
        assert_eq!(pole.head, thigh_twist.tail + Vec3::new(0.0, -0.4, 0.0));
        assert_eq!(thigh_twist.lock_ik, [true, false, true]);
    }
}

#[test]
fn leg_pole_anti_flip_network() {
    let mut armature = rigged_legs();
    rig::add_pole_constraint(
        &mut armature,
        Vec3::new(0.0, 0.02, 0.0),
        LEG_BONES,
        LEG_POLE,
        LEG_CTRL,
        "Leg.pole.constraint",
    )
    .unwrap();

    for side in Side::BOTH {
        let suffix = side.suffix();
        let blend = armature.bone(&format!("Leg.pole.constraint.2{suffix}")).unwrap();
        assert_eq!(blend.parent, None);
        assert_eq!(blend.constraints.len(), 3);
        let ConstraintKind::CopyTransforms { target, influence } = &blend.constraints[0].kind
        else {
            unreachable!()
        };
        assert_eq!(
            *target,
            ConstraintTarget::Bone(format!("Leg.pole.constraint.1{suffix}"))
        );
        assert_approx(*influence, 1.0);
        let ConstraintKind::CopyTransforms { target, influence } = &blend.constraints[1].kind
        else {
            unreachable!()
        };
        assert_eq!(
            *target,
            ConstraintTarget::Bone(format!("Leg.pole.constraint.3{suffix}"))
        );
        assert_approx(*influence, 0.5);
        assert!(matches!(
            blend.constraints[2].kind,
            ConstraintKind::DampedTrack { .. }
        ));

        // The root anchor rides the thigh's parent; the tip anchor rides the
        // controller; the pole itself now rides the blend bone.
        let anchor_root = armature.bone(&format!("Leg.pole.constraint.1{suffix}")).unwrap();
        assert_eq!(
            anchor_root.parent,
            armature.bone(&side.apply(LEG_BONES[0])).unwrap().parent
        );
        let anchor_tip = armature.bone(&format!("Leg.pole.constraint.3{suffix}")).unwrap();
        assert_eq!(anchor_tip.parent.as_deref(), Some(side.apply(LEG_CTRL).as_str()));
        assert_eq!(
            armature.bone(&side.apply(LEG_POLE)).unwrap().parent.as_deref(),
            Some(format!("Leg.pole.constraint.2{suffix}").as_str())
        );
    }
}

#[test]
fn finger_controller_network() {
    let mut armature = humanoid();
    rig::create_bone_groups(&mut armature);
    rig::add_root_bone(&mut armature).unwrap();
    rig::rig_arm(&mut armature).unwrap();
    rig::add_finger_controller(&mut armature).unwrap();

    for side in Side::BOTH {
        let ctrl = armature.bone(&side.apply("Finger.Ctrl")).unwrap();
        assert_eq!(ctrl.parent.as_deref(), Some(side.apply("Hand").as_str()));
        assert_eq!(ctrl.lock_location, [true, false, true]);
        assert_eq!(ctrl.group.as_deref(), Some(groups::SHAPEKEY_CONTROLLERS));
        let expected_roll = match side {
            Side::Left => (-130f32).to_radians(),
            Side::Right => 130f32.to_radians(),
        };
        assert_approx(ctrl.roll, expected_roll);
        assert!(ctrl.constraint("Limit Rotation").is_some());
        assert!(ctrl.constraint("Limit Location").is_some());

        // Thumbs are left alone.
        assert!(
            armature
                .bone(&side.apply("Thumb1"))
                .unwrap()
                .constraints
                .is_empty()
        );

        for finger in ["Index", "Mid", "Ring", "Pinky"] {
            // Clench evaluates ahead of grab on the first two segments.
            for segment in 1..=2 {
                let bone = armature.bone(&side.apply(&format!("{finger}{segment}"))).unwrap();
                let names: Vec<&str> =
                    bone.constraints.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, [rig::CLENCH_CONSTRAINT, rig::GRAB_CONSTRAINT]);
                let ConstraintKind::CopyRotation { axes, mix, .. } =
                    &bone.constraints[1].kind
                else {
                    unreachable!()
                };
                let expected_axes = if segment == 1 { Axes::ALL } else { Axes::X };
                assert_eq!(*axes, expected_axes);
                assert_eq!(*mix, MixMode::Add);
            }
            let tip = armature.bone(&side.apply(&format!("{finger}3"))).unwrap();
            let names: Vec<&str> = tip.constraints.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, [rig::CLENCH_CONSTRAINT]);
        }
    }
}
