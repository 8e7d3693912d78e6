//! Core types and traits for the invdyn batch evaluator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the seam between the orchestration layer and a multibody-dynamics
//! engine: typed indices, realization stages, the engine collaborator
//! traits, and the error types both sides share.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod stage;
pub mod traits;

pub use error::{EngineError, ModelLoadError, SolveError};
pub use id::{BodyIndex, CoordinateIndex, MarkerIndex, MuscleIndex};
pub use stage::Stage;
pub use traits::{
    ControlInput, CoordinateAccess, Engine, EngineModel, FrameKinematics,
    InverseDynamicsSolver, MomentumQueries, MultibodyModel, MuscleEnergetics, Realization,
};

/// Three-component vector used for all spatial quantities.
pub type Vec3 = nalgebra::Vector3<f64>;
