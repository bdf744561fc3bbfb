//! Driver graphs (expression-evaluated animation channels) and the
//! corrective-driver fixup builders.
//!
//! A [`DriverGraph`] hangs off an armature or a shape-key set. The fixup
//! builders insert small driver bones that isolate one rotation component
//! from IK-induced skew, then rebind the matching corrective drivers onto
//! them.

use crate::names::{
    ARM_BONES, Corrective, FOOT, FOOT_CORRECTIVES, FOOT_DRIVER, HAND, HAND_CORRECTIVES,
    HAND_DRIVER, LEG_BONES, SHLDR_DRIVER_X, SHLDR_DRIVER_Z, SHLDR_X_CORRECTIVES,
    SHLDR_Z_CORRECTIVES, Side,
};
use crate::{Armature, Axes, Constraint, Error, LayerMask, LockAxis, Orientation, TrackAxis};
use glam::Vec3;
use log::debug;

/// Hidden layers for the fixup driver bones.
pub const HAND_DRIVER_LAYER: u32 = 25;
pub const FOOT_DRIVER_LAYER: u32 = 27;
pub const SHLDR_DRIVER_LAYER: u32 = 25;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum DriverType {
    Average,
    Sum,
    #[default]
    Scripted,
    Min,
    Max,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Interpolation {
    Constant,
    Linear,
    #[default]
    Bezier,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Easing {
    #[default]
    Auto,
    EaseIn,
    EaseOut,
    EaseInOut,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum HandleType {
    Free,
    Aligned,
    Vector,
    #[default]
    Auto,
    AutoClamped,
}

/// One keyframe point of a driver F-curve, tangent handles included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub co: [f32; 2],
    pub interpolation: Interpolation,
    pub easing: Easing,
    pub handle_left: [f32; 2],
    pub handle_left_type: HandleType,
    pub handle_right: [f32; 2],
    pub handle_right_type: HandleType,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Keyframe {
        Keyframe {
            co: [time, value],
            interpolation: Interpolation::default(),
            easing: Easing::default(),
            handle_left: [time, value],
            handle_left_type: HandleType::default(),
            handle_right: [time, value],
            handle_right_type: HandleType::default(),
        }
    }
}

/// Kind tag of the data block a property reference points at.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IdType {
    Key,
    Armature,
    Object,
    Scene,
    Material,
}

/// A non-owning reference to an external data block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRef {
    pub id_type: IdType,
    pub name: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransformSpace {
    World,
    Transform,
    Local,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TransformChannel {
    LocX,
    LocY,
    LocZ,
    RotX,
    RotY,
    RotZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VariableKind {
    /// An arbitrary property path on an external data block.
    SingleProp { id: DataRef, data_path: String },
    /// A bone transform channel read off a rig object.
    Transform {
        object: String,
        bone_target: String,
        transform_space: TransformSpace,
        transform_type: TransformChannel,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DriverVariable {
    pub name: String,
    pub kind: VariableKind,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Driver {
    pub driver_type: DriverType,
    pub expression: String,
    pub variables: Vec<DriverVariable>,
}

/// A driver F-curve: the driven property's data path, the driver itself and
/// its keyframe mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct FCurve {
    pub data_path: String,
    pub driver: Driver,
    pub keyframes: Vec<Keyframe>,
}

impl FCurve {
    pub fn new(data_path: &str) -> FCurve {
        FCurve {
            data_path: data_path.to_string(),
            driver: Driver::default(),
            keyframes: Vec::new(),
        }
    }
}

/// The driver F-curves of one data block, keyed by data path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriverGraph {
    curves: Vec<FCurve>,
}

impl DriverGraph {
    pub fn new() -> DriverGraph {
        DriverGraph::default()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn get(&self, data_path: &str) -> Option<&FCurve> {
        self.curves.iter().find(|c| c.data_path == data_path)
    }

    /// Creates a fresh curve at `data_path`. Data paths are unique; creating
    /// a second curve at an existing path is an error (re-running a transfer
    /// is not idempotent).
    pub fn add(&mut self, data_path: &str) -> Result<&mut FCurve, Error> {
        if self.get(data_path).is_some() {
            return Err(Error::DuplicateDriverPath {
                path: data_path.to_string(),
            });
        }
        self.curves.push(FCurve::new(data_path));
        Ok(self.curves.last_mut().expect("just pushed"))
    }

    pub fn push(&mut self, curve: FCurve) -> Result<(), Error> {
        if self.get(&curve.data_path).is_some() {
            return Err(Error::DuplicateDriverPath {
                path: curve.data_path,
            });
        }
        self.curves.push(curve);
        Ok(())
    }

    pub fn curves(&self) -> impl Iterator<Item = &FCurve> {
        self.curves.iter()
    }

    pub fn curves_mut(&mut self) -> impl Iterator<Item = &mut FCurve> {
        self.curves.iter_mut()
    }
}

/// Rebinds every corrective driver matching one of `table`'s side-resolved
/// patterns: transform-type variables move onto `new_target`, and rows that
/// carry a replacement expression overwrite the driver expression. SingleProp
/// variables are never touched.
fn rebind_correctives(graph: &mut DriverGraph, table: &[Corrective], side: Side, new_target: &str) {
    let resolved: Vec<(String, Option<&'static str>)> = table
        .iter()
        .map(|(pattern, expression)| (pattern.resolve(side), *expression))
        .collect();
    for curve in graph.curves_mut() {
        for (pattern, expression) in &resolved {
            if !curve.data_path.contains(pattern.as_str()) {
                continue;
            }
            debug!("rebinding driver {} -> {new_target}", curve.data_path);
            for variable in &mut curve.driver.variables {
                if let VariableKind::Transform { bone_target, .. } = &mut variable.kind {
                    *bone_target = new_target.to_string();
                }
            }
            if let Some(expression) = expression {
                curve.driver.expression = (*expression).to_string();
            }
        }
    }
}

/// Fixes the interaction of the hand corrective shape keys with arm IK.
///
/// The wrist correctives originally read the hand bone's local rotation,
/// which IK skews; a small driver bone tracked onto the hand isolates the
/// up/down component.
pub fn fix_hand_driver(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        let hand_driver = side.apply(HAND_DRIVER);
        let forearm = side.apply(ARM_BONES[3]);
        armature.extrude_bone(
            &forearm,
            Vec3::new(0.0, -0.01, 0.0),
            &hand_driver,
            Some(&forearm),
            Orientation::Normal,
            false,
        )?;
        armature.add_constraint(
            &hand_driver,
            Constraint::locked_track(&side.apply(HAND), 1.0, TrackAxis::NegY, LockAxis::Z),
        )?;
        armature.add_constraint(
            &hand_driver,
            Constraint::limit_rotation(
                Axes::Z,
                Vec3::new(0.0, 0.0, -90.0),
                Vec3::new(0.0, 0.0, 90.0),
            ),
        )?;
        armature.set_layers(&hand_driver, LayerMask::single(HAND_DRIVER_LAYER))?;
    }
    for side in Side::BOTH {
        let hand_driver = side.apply(HAND_DRIVER);
        rebind_correctives(&mut armature.drivers, HAND_CORRECTIVES, side, &hand_driver);
    }
    Ok(())
}

/// Fixes the interaction of the foot corrective shape keys with leg IK.
pub fn fix_foot_driver(armature: &mut Armature) -> Result<(), Error> {
    for side in Side::BOTH {
        let foot_driver = side.apply(FOOT_DRIVER);
        let shin = side.apply(LEG_BONES[2]);
        armature.extrude_bone(
            &shin,
            Vec3::new(0.0, -0.01, 0.0),
            &foot_driver,
            Some(&shin),
            Orientation::Normal,
            false,
        )?;
        armature.add_constraint(
            &foot_driver,
            Constraint::locked_track(&side.apply(FOOT), 1.0, TrackAxis::NegZ, LockAxis::X),
        )?;
        armature.add_constraint(
            &foot_driver,
            Constraint::limit_rotation(
                Axes::X,
                Vec3::new(-90.0, 0.0, 0.0),
                Vec3::new(90.0, 0.0, 0.0),
            ),
        )?;
        armature.set_layers(&foot_driver, LayerMask::single(FOOT_DRIVER_LAYER))?;
    }
    for side in Side::BOTH {
        let foot_driver = side.apply(FOOT_DRIVER);
        rebind_correctives(&mut armature.drivers, FOOT_CORRECTIVES, side, &foot_driver);
    }
    Ok(())
}

/// Fixes the interaction of the shoulder corrective shape keys with arm IK.
///
/// The shoulder needs two driver bones because its correctives split over two
/// independent rotation axes.
pub fn fix_shldr_driver(armature: &mut Armature) -> Result<(), Error> {
    armature.with_all_visible(|armature| {
        for side in Side::BOTH {
            let shldr = side.apply(ARM_BONES[0]);

            let driver_x = side.apply(SHLDR_DRIVER_X);
            armature.duplicate_bone(&shldr, &driver_x, None, Some(0.03))?;
            armature.add_constraint(
                &driver_x,
                Constraint::locked_track(&shldr, 1.0, TrackAxis::Y, LockAxis::X),
            )?;
            armature.add_constraint(
                &driver_x,
                Constraint::limit_rotation(
                    Axes::X,
                    Vec3::new(-40.0, 0.0, 0.0),
                    Vec3::new(110.0, 0.0, 0.0),
                ),
            )?;
            armature.set_layers(&driver_x, LayerMask::single(SHLDR_DRIVER_LAYER))?;

            let driver_z = side.apply(SHLDR_DRIVER_Z);
            armature.duplicate_bone(&shldr, &driver_z, None, Some(0.03))?;
            armature.add_constraint(
                &driver_z,
                Constraint::locked_track(&shldr, 1.0, TrackAxis::Y, LockAxis::Z),
            )?;
            armature.add_constraint(
                &driver_z,
                Constraint::limit_rotation(
                    Axes::Z,
                    Vec3::new(0.0, 0.0, -40.0),
                    Vec3::new(0.0, 0.0, 90.0),
                ),
            )?;
            armature.set_layers(&driver_z, LayerMask::single(SHLDR_DRIVER_LAYER))?;

            rebind_correctives(&mut armature.drivers, SHLDR_X_CORRECTIVES, side, &driver_x);
            rebind_correctives(&mut armature.drivers, SHLDR_Z_CORRECTIVES, side, &driver_z);
        }
        Ok(())
    })
}

/// A named shape-key data block: its key blocks and the driver graph
/// animating them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeKeySet {
    pub name: String,
    pub key_blocks: Vec<String>,
    pub drivers: DriverGraph,
}

impl ShapeKeySet {
    pub fn new(name: &str) -> ShapeKeySet {
        ShapeKeySet {
            name: name.to_string(),
            key_blocks: Vec::new(),
            drivers: DriverGraph::new(),
        }
    }

    pub fn has_key_block(&self, name: &str) -> bool {
        self.key_blocks.iter().any(|k| k == name)
    }
}
