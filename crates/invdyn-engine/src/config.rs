//! Evaluator configuration, validation, and error types.
//!
//! [`EvaluatorConfig`] fixes every behavior that varies between
//! deployments of the evaluator: pool size, name and lock policies,
//! acceleration matching, scheduling, and failure handling.
//! [`validate()`](EvaluatorConfig::validate) checks invariants before a
//! pool is built. The struct deserializes from JSON with every field
//! optional.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of replicas (and worker threads).
pub const DEFAULT_POOL_SIZE: usize = 20;

/// Upper bound on the replica count.
pub const MAX_POOL_SIZE: usize = 1024;

/// Default tolerance for [`AccelerationMatching::ValueTolerance`].
pub const DEFAULT_VALUE_TOLERANCE: f64 = 1e-6;

// ── Policies ───────────────────────────────────────────────────────

/// What to do with a trajectory channel naming no model coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCoordinatePolicy {
    /// Fail the call before any sample runs.
    #[default]
    Reject,
    /// Treat the channel as a no-op (logged once per call).
    Ignore,
}

/// Whether the binder writes locked coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockedCoordinatePolicy {
    /// Skip value and speed writes for locked coordinates.
    #[default]
    Respect,
    /// Write every bound channel regardless of lock state.
    Overwrite,
}

/// How each native coordinate finds its acceleration column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationMatching {
    /// Match by coordinate name, resolved once per call.
    #[default]
    ByName,
    /// Match the column whose bound value lies within `tolerance` of the
    /// coordinate's current value. Later matches override earlier ones.
    ValueTolerance {
        /// Absolute tolerance on the value comparison.
        tolerance: f64,
    },
    /// Match the first column whose bound value equals the coordinate's
    /// value exactly. Coordinates whose value is exactly zero get zero
    /// acceleration.
    ExactValue,
}

impl AccelerationMatching {
    /// Value matching at [`DEFAULT_VALUE_TOLERANCE`].
    pub fn value_tolerance() -> Self {
        Self::ValueTolerance {
            tolerance: DEFAULT_VALUE_TOLERANCE,
        }
    }
}

/// How samples are assigned to replicas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Sample `i` runs on replica `i % pool_size`.
    #[default]
    Strided,
    /// Replicas pull sample indices from a shared queue.
    Dynamic,
}

/// What a per-sample engine failure does to the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the batch, reporting the lowest failing sample.
    #[default]
    Abort,
    /// Fill the sample's rows with NaN, record it, and continue.
    MarkInvalid,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`EvaluatorConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Pool size is zero or above [`MAX_POOL_SIZE`].
    InvalidPoolSize {
        /// The configured size.
        configured: usize,
    },
    /// Value-matching tolerance is negative or not finite.
    InvalidTolerance {
        /// The configured tolerance.
        value: f64,
    },
    /// JSON configuration could not be parsed.
    Parse {
        /// Parser error message.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { configured } => write!(
                f,
                "pool_size {configured} must be between 1 and {MAX_POOL_SIZE}"
            ),
            Self::InvalidTolerance { value } => {
                write!(f, "value tolerance must be finite and >= 0, got {value}")
            }
            Self::Parse { reason } => write!(f, "config parse error: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── EvaluatorConfig ────────────────────────────────────────────────

/// Complete configuration for an [`Evaluator`](crate::Evaluator).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Replicas built per load; also the worker thread count. Default: 20.
    pub pool_size: usize,
    /// Unknown channel names. Default: reject.
    pub unknown_coordinates: UnknownCoordinatePolicy,
    /// Locked coordinate writes. Default: respect locks.
    pub locked_coordinates: LockedCoordinatePolicy,
    /// Acceleration column matching. Default: by name.
    pub acceleration_matching: AccelerationMatching,
    /// Sample-to-replica assignment. Default: strided.
    pub schedule: Schedule,
    /// Per-sample failure handling. Default: abort.
    pub failure_policy: FailurePolicy,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            unknown_coordinates: UnknownCoordinatePolicy::default(),
            locked_coordinates: LockedCoordinatePolicy::default(),
            acceleration_matching: AccelerationMatching::default(),
            schedule: Schedule::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl EvaluatorConfig {
    /// Validate all invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pool_size(self.pool_size)?;
        if let AccelerationMatching::ValueTolerance { tolerance } = self.acceleration_matching {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ConfigError::InvalidTolerance { value: tolerance });
            }
        }
        Ok(())
    }

    /// Parse and validate from JSON; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the unknown-coordinate policy.
    pub fn with_unknown_coordinates(mut self, policy: UnknownCoordinatePolicy) -> Self {
        self.unknown_coordinates = policy;
        self
    }

    /// Set the locked-coordinate policy.
    pub fn with_locked_coordinates(mut self, policy: LockedCoordinatePolicy) -> Self {
        self.locked_coordinates = policy;
        self
    }

    /// Set the acceleration matching mode.
    pub fn with_acceleration_matching(mut self, matching: AccelerationMatching) -> Self {
        self.acceleration_matching = matching;
        self
    }

    /// Set the schedule.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

pub(crate) fn validate_pool_size(pool_size: usize) -> Result<(), ConfigError> {
    if pool_size == 0 || pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::InvalidPoolSize {
            configured: pool_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = EvaluatorConfig::default();
        assert_eq!(c.pool_size, 20);
        assert_eq!(c.unknown_coordinates, UnknownCoordinatePolicy::Reject);
        assert_eq!(c.locked_coordinates, LockedCoordinatePolicy::Respect);
        assert_eq!(c.acceleration_matching, AccelerationMatching::ByName);
        assert_eq!(c.schedule, Schedule::Strided);
        assert_eq!(c.failure_policy, FailurePolicy::Abort);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_pool_size_rejected() {
        let c = EvaluatorConfig::default().with_pool_size(0);
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidPoolSize { configured: 0 })
        );
    }

    #[test]
    fn oversized_pool_rejected() {
        let c = EvaluatorConfig::default().with_pool_size(MAX_POOL_SIZE + 1);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidPoolSize { .. })
        ));
    }

    #[test]
    fn negative_tolerance_rejected() {
        let c = EvaluatorConfig::default().with_acceleration_matching(
            AccelerationMatching::ValueTolerance { tolerance: -1.0 },
        );
        assert_eq!(
            c.validate(),
            Err(ConfigError::InvalidTolerance { value: -1.0 })
        );
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let c = EvaluatorConfig::from_json_str(
            r#"{ "pool_size": 4, "schedule": "dynamic",
                 "acceleration_matching": { "value_tolerance": { "tolerance": 1e-3 } } }"#,
        )
        .unwrap();
        assert_eq!(c.pool_size, 4);
        assert_eq!(c.schedule, Schedule::Dynamic);
        assert_eq!(
            c.acceleration_matching,
            AccelerationMatching::ValueTolerance { tolerance: 1e-3 }
        );
        assert_eq!(c.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn json_with_invalid_values_fails_validation() {
        let err = EvaluatorConfig::from_json_str(r#"{ "pool_size": 0 }"#).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPoolSize { configured: 0 });
        let err = EvaluatorConfig::from_json_str(r#"{ "pool": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
