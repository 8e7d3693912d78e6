//! Replica pool and parallel batch evaluator for trajectory inverse
//! dynamics.
//!
//! An [`Evaluator`] owns a [`ReplicaPool`] of independent model
//! replicas built by any [`Engine`](invdyn_core::Engine). Each call to
//! [`Evaluator::evaluate`] binds a [`Trajectory`]'s named channels onto
//! the replicas, reconciles accelerations into native coordinate order,
//! applies controls, solves inverse dynamics, and runs the extractors
//! selected by an [`EvaluationRequest`], all in parallel with one
//! worker per replica. Results come back as column-major
//! [`OutputRecords`] in input sample order.
//!
//! Components, leaves first:
//!
//! - [`pool`]: replicas and their worker threads.
//! - [`binder`]: named channel → coordinate binding.
//! - [`reconcile`]: external acceleration columns → native order.
//! - [`controls`]: actuator control application.
//! - [`extract`]: derived-quantity extractors.
//! - [`evaluator`]: the per-sample pipeline and schedules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binder;
pub mod config;
pub mod controls;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod metrics;
pub mod output;
pub mod pool;
pub mod reconcile;
pub mod request;
pub mod trajectory;

pub use binder::ChannelBindings;
pub use config::{
    AccelerationMatching, ConfigError, EvaluatorConfig, FailurePolicy, LockedCoordinatePolicy,
    Schedule, UnknownCoordinatePolicy,
};
pub use error::EvalError;
pub use evaluator::Evaluator;
pub use extract::ExtractionPlan;
pub use metrics::EvaluationMetrics;
pub use output::{ColumnBuffer, OutputRecords};
pub use pool::{Replica, ReplicaPool};
pub use reconcile::AccelerationReconciler;
pub use request::{BodyRef, EvaluationRequest, MarkerSelection, PointSpec};
pub use trajectory::{Table, Trajectory};
