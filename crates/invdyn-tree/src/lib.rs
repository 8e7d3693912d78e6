//! Reference rigid-body tree engine for the invdyn batch evaluator.
//!
//! Implements every collaborator trait in [`invdyn_core::traits`] for
//! open kinematic trees of revolute, prismatic and weld joints:
//!
//! - [`ModelDescription`]: serde-backed model description with validation.
//! - [`TreeModel`]: the loaded model (bodies, coordinates, markers, muscles).
//! - [`TreeState`]: per-replica state with realization-stage tracking.
//! - [`TreeSolver`]: recursive Newton–Euler inverse dynamics.
//! - [`TreeEngine`]: the [`Engine`](invdyn_core::Engine) that builds models.
//!
//! All quantities are SI and expressed in the ground frame unless a
//! name says otherwise.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod description;
pub mod dynamics;
pub mod engine;
mod kinematics;
pub mod model;
mod muscle;
pub mod state;

pub use description::{
    ActuatorDescription, BodyDescription, CoordinateDescription, JointDescription, JointKind,
    MarkerDescription, MetabolicProbeDescription, ModelDescription, MuscleDescription, GROUND,
};
pub use dynamics::TreeSolver;
pub use engine::TreeEngine;
pub use model::TreeModel;
pub use state::TreeState;
