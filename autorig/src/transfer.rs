//! Copies a driver graph from one shape-key set to another, remapping every
//! identifier that must point at the destination object.

use crate::drivers::{DataRef, DriverVariable, IdType, ShapeKeySet, VariableKind};
use crate::names::shape_key_from_data_path;
use log::{debug, warn};

#[derive(Copy, Clone, Debug)]
pub struct TransferParams {
    /// Only create destination curves for shape keys the destination already
    /// has.
    pub transfer_only_existing: bool,
}

impl Default for TransferParams {
    fn default() -> Self {
        TransferParams {
            transfer_only_existing: true,
        }
    }
}

/// Copies every driver F-curve of `src` onto `dst`, rewriting data-block and
/// object references so they resolve against the destination rig.
///
/// Best-effort per curve: a curve that cannot be created (typically a
/// duplicate data path from an earlier transfer) is logged and skipped, and
/// the rest of the batch still goes through. Returns the number of curves
/// copied.
pub fn transfer_drivers(
    src: &ShapeKeySet,
    dst: &mut ShapeKeySet,
    dst_rig: &str,
    dst_armature: &str,
    params: TransferParams,
) -> usize {
    let mut copied = 0;
    for curve in src.drivers.curves() {
        if params.transfer_only_existing {
            let key = shape_key_from_data_path(&curve.data_path);
            if !key.is_some_and(|key| dst.has_key_block(key)) {
                continue;
            }
        }
        let new_curve = match dst.drivers.add(&curve.data_path) {
            Ok(new_curve) => new_curve,
            Err(e) => {
                warn!("skipping driver {}: {e}", curve.data_path);
                continue;
            }
        };
        debug!("transferring driver {}", curve.data_path);

        new_curve.keyframes.clear();
        new_curve.keyframes.extend(curve.keyframes.iter().copied());

        new_curve.driver.driver_type = curve.driver.driver_type;
        new_curve.driver.expression = curve.driver.expression.clone();
        new_curve.driver.variables = curve
            .driver
            .variables
            .iter()
            .map(|variable| retarget_variable(variable, &dst.name, dst_rig, dst_armature))
            .collect();
        copied += 1;
    }
    copied
}

fn retarget_variable(
    variable: &DriverVariable,
    dst_key: &str,
    dst_rig: &str,
    dst_armature: &str,
) -> DriverVariable {
    let kind = match &variable.kind {
        VariableKind::SingleProp { id, data_path } => {
            let name = match id.id_type {
                IdType::Key => dst_key.to_string(),
                IdType::Armature => dst_armature.to_string(),
                // Unrelated external references stay valid across both
                // objects.
                _ => id.name.clone(),
            };
            VariableKind::SingleProp {
                id: DataRef {
                    id_type: id.id_type,
                    name,
                },
                data_path: data_path.clone(),
            }
        }
        VariableKind::Transform {
            bone_target,
            transform_space,
            transform_type,
            ..
        } => VariableKind::Transform {
            object: dst_rig.to_string(),
            bone_target: bone_target.clone(),
            transform_space: *transform_space,
            transform_type: *transform_type,
        },
    };
    DriverVariable {
        name: variable.name.clone(),
        kind,
    }
}
