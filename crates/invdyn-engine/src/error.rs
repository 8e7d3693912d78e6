//! Error type for the batch evaluator.

use std::error::Error;
use std::fmt;

use invdyn_core::{EngineError, ModelLoadError};

use crate::config::ConfigError;

/// Errors from loading a pool or evaluating a trajectory.
///
/// Everything except [`Sample`](Self::Sample) is detected before any
/// sample runs.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// `evaluate` was called with no pool loaded.
    NoModelLoaded,
    /// A replica's model or initial state could not be built.
    ModelLoad(ModelLoadError),
    /// The configuration is invalid.
    Config(ConfigError),
    /// A trajectory channel names no model coordinate.
    UnknownCoordinate {
        /// The unresolved name.
        name: String,
        /// Trajectory column carrying the name.
        column: usize,
    },
    /// A coordinate name appears twice in the trajectory.
    DuplicateCoordinate {
        /// The repeated name.
        name: String,
    },
    /// A requested body does not exist.
    UnknownBody {
        /// The body reference as given.
        body: String,
    },
    /// A requested marker does not exist.
    UnknownMarker {
        /// The unresolved name.
        name: String,
    },
    /// An input table or vector has the wrong size.
    DimensionMismatch {
        /// Which input was wrong.
        what: &'static str,
        /// Size the model or trajectory requires.
        expected: usize,
        /// Size supplied.
        actual: usize,
    },
    /// The trajectory has no samples.
    EmptyTrajectory,
    /// The engine failed on one sample.
    Sample {
        /// Index of the failing sample (0-based). Under the abort policy
        /// this is the lowest failing index.
        sample: usize,
        /// The underlying engine error.
        error: EngineError,
    },
    /// The worker thread pool could not be created.
    ThreadPool {
        /// Builder error message.
        reason: String,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModelLoaded => write!(f, "no model loaded"),
            Self::ModelLoad(e) => write!(f, "model load failed: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::UnknownCoordinate { name, column } => {
                write!(f, "trajectory column {column}: unknown coordinate '{name}'")
            }
            Self::DuplicateCoordinate { name } => {
                write!(f, "coordinate '{name}' appears more than once")
            }
            Self::UnknownBody { body } => write!(f, "unknown body {body}"),
            Self::UnknownMarker { name } => write!(f, "unknown marker '{name}'"),
            Self::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected {expected}, got {actual}"),
            Self::EmptyTrajectory => write!(f, "trajectory has no samples"),
            Self::Sample { sample, error } => write!(f, "sample {sample}: {error}"),
            Self::ThreadPool { reason } => write!(f, "cannot build worker pool: {reason}"),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ModelLoad(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Sample { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ModelLoadError> for EvalError {
    fn from(e: ModelLoadError) -> Self {
        Self::ModelLoad(e)
    }
}

impl From<ConfigError> for EvalError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
