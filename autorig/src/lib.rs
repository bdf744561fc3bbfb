//! Procedural humanoid rig construction and corrective-driver retargeting.
//!
//! This crate is host-agnostic: it owns an in-memory armature model and the
//! naming-convention-driven builders that add IK chains, the foot rocker,
//! finger controllers and pose-space driver fixups to a DAZ-derived skeleton,
//! plus a driver-transfer engine for shape-key sets. Syncing the result into
//! a particular 3D editor's document is left to integration layers.

#![forbid(unsafe_code)]

mod armature;
mod command;
mod drivers;
mod error;
mod model;
mod rig;
mod shapes;
mod transfer;

pub mod names;

#[cfg(feature = "json")]
mod json;

pub use armature::*;
pub use command::*;
pub use drivers::*;
pub use error::*;
pub use model::*;
pub use names::Side;
pub use rig::*;
pub use shapes::*;
pub use transfer::*;

#[cfg(test)]
mod fixtures;



#[cfg(test)]
mod rig_tests;




#[cfg(test)]
mod command_tests;
