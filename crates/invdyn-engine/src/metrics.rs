//! Per-evaluation performance metrics.
//!
//! [`EvaluationMetrics`] captures timing and scheduling data for one
//! `evaluate` call and is attached to its
//! [`OutputRecords`](crate::OutputRecords).

/// Timing and scheduling metrics collected during one evaluation.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluationMetrics {
    /// Wall-clock time for the entire call, in microseconds.
    pub total_us: u64,
    /// Time spent resolving names and checking dimensions, in microseconds.
    pub validation_us: u64,
    /// Time spent in the parallel region, in microseconds.
    pub parallel_us: u64,
    /// Number of samples evaluated (including failed ones).
    pub samples: usize,
    /// Samples run by each replica, indexed by replica.
    pub replica_samples: Vec<usize>,
    /// Number of samples that failed.
    pub failed_samples: usize,
}

impl EvaluationMetrics {
    /// Mean samples per replica, or 0 with no replicas.
    pub fn mean_replica_load(&self) -> f64 {
        if self.replica_samples.is_empty() {
            return 0.0;
        }
        let total: usize = self.replica_samples.iter().sum();
        total as f64 / self.replica_samples.len() as f64
    }
}
