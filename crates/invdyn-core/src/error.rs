//! Error types shared by engines and the batch evaluator.
//!
//! Organized by when the failure happens: model construction
//! ([`ModelLoadError`]), the inverse-dynamics solve ([`SolveError`]),
//! and any other per-call engine failure ([`EngineError`]).

use std::error::Error;
use std::fmt;

use crate::stage::Stage;

/// Errors from building a model or its initial state.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelLoadError {
    /// The description could not be read from disk.
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
    /// The description is not syntactically valid.
    Parse {
        /// Parser error message.
        reason: String,
    },
    /// The description parsed but violates a structural invariant
    /// (dangling parent, duplicate name, non-positive mass, ...).
    Invalid {
        /// Description of the violated invariant.
        reason: String,
    },
    /// The engine could not realize an initial state for the model.
    InitialState {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "cannot read model '{path}': {reason}"),
            Self::Parse { reason } => write!(f, "model description parse error: {reason}"),
            Self::Invalid { reason } => write!(f, "invalid model description: {reason}"),
            Self::InitialState { reason } => {
                write!(f, "cannot realize initial state: {reason}")
            }
        }
    }
}

impl Error for ModelLoadError {}

/// Errors from the inverse-dynamics solve.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    /// The solve produced a non-finite generalized force.
    NonFinite {
        /// Native index of the first offending coordinate.
        coordinate: usize,
    },
    /// The solver failed for an engine-specific reason
    /// (e.g. non-convergence).
    Failed {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { coordinate } => {
                write!(f, "non-finite generalized force at coordinate {coordinate}")
            }
            Self::Failed { reason } => write!(f, "solve failed: {reason}"),
        }
    }
}

impl Error for SolveError {}

/// Errors from a single engine call on a model/state pair.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// A query needs a higher realization stage than the state has.
    Stage {
        /// Stage the query requires.
        required: Stage,
        /// Stage the state is currently at.
        current: Stage,
    },
    /// An index is outside the model's set of that kind.
    IndexOutOfRange {
        /// Which set was indexed ("coordinate", "body", ...).
        kind: &'static str,
        /// The offending index.
        index: usize,
        /// Size of the set.
        len: usize,
    },
    /// An input vector has the wrong length.
    DimensionMismatch {
        /// Which input was wrong.
        what: &'static str,
        /// Length the model expects.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
    /// Dynamics was realized without valid controls.
    ControlsNotValid,
    /// The inverse-dynamics solve failed.
    Solve(SolveError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage { required, current } => write!(
                f,
                "state realized to {current} but query requires {required}"
            ),
            Self::IndexOutOfRange { kind, index, len } => {
                write!(f, "{kind} index {index} out of range (len={len})")
            }
            Self::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected {expected} entries, got {actual}"),
            Self::ControlsNotValid => write!(f, "controls not marked valid before dynamics"),
            Self::Solve(e) => write!(f, "{e}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Solve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SolveError> for EngineError {
    fn from(e: SolveError) -> Self {
        Self::Solve(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_names_both_stages() {
        let err = EngineError::Stage {
            required: Stage::Velocity,
            current: Stage::Time,
        };
        let msg = err.to_string();
        assert!(msg.contains("velocity") && msg.contains("time"), "got: {msg}");
    }

    #[test]
    fn solve_error_is_source_of_engine_error() {
        let err = EngineError::from(SolveError::NonFinite { coordinate: 2 });
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("non-finite generalized force at coordinate 2")
        );
    }
}
