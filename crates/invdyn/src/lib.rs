//! invdyn: parallel batch inverse dynamics for multibody trajectories.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the invdyn sub-crates. For most users, adding `invdyn` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use invdyn::prelude::*;
//!
//! let model = ModelDescription::from_json_str(r#"{
//!     "name": "pendulum",
//!     "gravity": [0.0, -9.81, 0.0],
//!     "bodies": [{
//!         "name": "rod",
//!         "mass": 1.0,
//!         "mass_center": [0.0, -1.0, 0.0],
//!         "joint": { "kind": "revolute", "coordinate": { "name": "theta" } }
//!     }]
//! }"#).unwrap();
//!
//! let mut evaluator =
//!     Evaluator::new(TreeEngine, EvaluatorConfig::default().with_pool_size(2)).unwrap();
//! evaluator.load(&model).unwrap();
//!
//! // Held horizontal and at rest: the joint carries the full weight arm.
//! let trajectory = Trajectory::new(
//!     vec![0.0],
//!     ["theta"],
//!     Table::from_rows(&[[std::f64::consts::FRAC_PI_2]]).unwrap(),
//!     Table::zeros(1, 1),
//!     Table::zeros(1, 1),
//!     Table::zeros(1, 0),
//! )
//! .unwrap();
//! let out = evaluator.evaluate(&trajectory, &EvaluationRequest::new()).unwrap();
//! let tau = out.generalized_forces.get(0, 0).unwrap();
//! assert!((tau - 9.81).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `invdyn-core` | Indices, stages, errors, engine traits |
//! | [`tree`] | `invdyn-tree` | Reference rigid-body tree engine |
//! | [`engine`] | `invdyn-engine` | Replica pool, evaluator, requests and outputs |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and indices (`invdyn-core`).
///
/// Implement the collaborator traits in [`types::traits`] to plug a
/// different multibody engine into the evaluator.
pub use invdyn_core as types;

/// Reference rigid-body tree engine (`invdyn-tree`).
///
/// [`tree::TreeEngine`] builds [`tree::TreeModel`]s from a
/// [`tree::ModelDescription`].
pub use invdyn_tree as tree;

/// Batch evaluation (`invdyn-engine`).
///
/// [`engine::Evaluator`] is the entry point.
pub use invdyn_engine as engine;

/// Common imports for typical invdyn usage.
///
/// ```rust
/// use invdyn::prelude::*;
/// ```
pub mod prelude {
    // Core traits and errors
    pub use invdyn_core::{Engine, EngineError, ModelLoadError, MultibodyModel, SolveError};

    // Reference engine
    pub use invdyn_tree::{ModelDescription, TreeEngine};

    // Evaluator
    pub use invdyn_engine::{
        AccelerationMatching, BodyRef, EvalError, EvaluationMetrics, EvaluationRequest, Evaluator,
        EvaluatorConfig, FailurePolicy, LockedCoordinatePolicy, MarkerSelection, OutputRecords,
        PointSpec, Schedule, Table, Trajectory, UnknownCoordinatePolicy,
    };
}
