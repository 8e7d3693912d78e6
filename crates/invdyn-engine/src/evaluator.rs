//! The batch evaluator.
//!
//! [`Evaluator`] is the caller-owned context: it holds the engine, the
//! configuration, and at most one [`ReplicaPool`]. Loading and
//! evaluating both take `&mut self`, so a pool can never be rebuilt
//! under an in-flight batch.
//!
//! # Per-sample pipeline
//!
//! For sample `i` on its replica:
//!
//! 1. set time, bind values and speeds, realize velocity;
//! 2. angular momentum (before controls are applied);
//! 3. mass-center velocity when `i` is the first or last sample;
//! 4. reconcile accelerations, apply controls, realize dynamics;
//! 5. solve inverse dynamics;
//! 6. orientation, angular velocity, marker and point kinematics;
//! 7. metabolic cost.
//!
//! Every step reads only sample `i`'s inputs, and results are
//! scattered into sample-indexed rows, so execution order never
//! affects the output.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use invdyn_core::{
    CoordinateAccess, CoordinateIndex, Engine, EngineError, EngineModel, MultibodyModel,
    Realization,
};
use rayon::prelude::*;

use crate::binder::ChannelBindings;
use crate::config::{EvaluatorConfig, FailurePolicy, Schedule};
use crate::controls::{apply_controls, check_control_width};
use crate::error::EvalError;
use crate::extract::ExtractionPlan;
use crate::metrics::EvaluationMetrics;
use crate::output::{OutputBuilder, OutputRecords, SampleRecord};
use crate::pool::{Replica, ReplicaPool};
use crate::reconcile::AccelerationReconciler;
use crate::request::EvaluationRequest;
use crate::trajectory::Trajectory;

/// `(replica, sample, result)` for one processed sample.
type Outcome = (usize, usize, Result<SampleRecord, EngineError>);

// ── Evaluator ──────────────────────────────────────────────────────

/// Caller-owned batch inverse-dynamics evaluator.
pub struct Evaluator<E: Engine> {
    engine: E,
    config: EvaluatorConfig,
    pool: Option<ReplicaPool<E::Model>>,
}

impl<E: Engine> Evaluator<E> {
    /// Create an evaluator with no pool loaded.
    ///
    /// # Errors
    ///
    /// [`EvalError::Config`] if `config` fails validation.
    pub fn new(engine: E, config: EvaluatorConfig) -> Result<Self, EvalError> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            pool: None,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The loaded pool, if any.
    pub fn pool(&self) -> Option<&ReplicaPool<E::Model>> {
        self.pool.as_ref()
    }

    /// Whether a pool is loaded.
    pub fn is_loaded(&self) -> bool {
        self.pool.is_some()
    }

    /// Build a pool of the configured size from `description`.
    ///
    /// See [`load_with_pool_size`](Self::load_with_pool_size).
    pub fn load(&mut self, description: &E::Description) -> Result<(), EvalError> {
        self.load_with_pool_size(description, self.config.pool_size)
    }

    /// Build a pool of `pool_size` replicas from `description`.
    ///
    /// Any existing pool is torn down first. On failure no pool is
    /// loaded afterwards.
    pub fn load_with_pool_size(
        &mut self,
        description: &E::Description,
        pool_size: usize,
    ) -> Result<(), EvalError> {
        self.teardown();
        let start = Instant::now();
        match ReplicaPool::build(&self.engine, description, pool_size) {
            Ok(pool) => {
                tracing::info!(
                    model = pool.model().map_or("", |m| m.name()),
                    replicas = pool.len(),
                    coordinates = pool.model().map_or(0, |m| m.coordinate_count()),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "model loaded"
                );
                self.pool = Some(pool);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "model load failed; no pool loaded");
                Err(e)
            }
        }
    }

    /// Release the pool. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(pool) = self.pool.take() {
            tracing::info!(replicas = pool.len(), "replica pool torn down");
        }
    }

    /// Evaluate every sample of `trajectory`.
    ///
    /// All name and dimension checks run before any sample does. Under
    /// [`FailurePolicy::Abort`] the first engine failure (by sample
    /// index) fails the batch; under [`FailurePolicy::MarkInvalid`] the
    /// failing sample's rows are NaN and listed in
    /// [`OutputRecords::failed_samples`].
    pub fn evaluate(
        &mut self,
        trajectory: &Trajectory,
        request: &EvaluationRequest,
    ) -> Result<OutputRecords, EvalError> {
        let start = Instant::now();
        let pool = self.pool.as_mut().ok_or(EvalError::NoModelLoaded)?;
        let model = pool.model().ok_or(EvalError::NoModelLoaded)?;
        if trajectory.is_empty() {
            return Err(EvalError::EmptyTrajectory);
        }

        let pipeline = SamplePipeline::prepare(model, &self.config, trajectory, request)?;
        let coordinate_names: Vec<String> = (0..model.coordinate_count())
            .map(|c| {
                model
                    .coordinate_name(CoordinateIndex(c))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        let layout = pipeline.plan.layout(coordinate_names.len());
        let validation_us = start.elapsed().as_micros() as u64;

        let abort = self.config.failure_policy == FailurePolicy::Abort;
        let samples = trajectory.len();
        tracing::debug!(
            samples,
            replicas = pool.len(),
            schedule = ?self.config.schedule,
            channels = pipeline.bindings.len(),
            "evaluating trajectory"
        );

        let parallel_start = Instant::now();
        let (replicas, threads) = pool.split_mut();
        let replica_count = replicas.len();
        let outcomes = match self.config.schedule {
            Schedule::Strided => run_strided(replicas, threads, &pipeline, abort),
            Schedule::Dynamic => run_dynamic(replicas, threads, &pipeline, abort),
        };
        let parallel_us = parallel_start.elapsed().as_micros() as u64;

        let mut builder = OutputBuilder::new(&layout, samples);
        let mut replica_samples = vec![0; replica_count];
        let mut first_failure: Option<(usize, EngineError)> = None;
        let mut failed = 0;
        for (r, i, result) in outcomes {
            replica_samples[r] += 1;
            match result {
                Ok(record) => builder.write(i, &record),
                Err(error) => {
                    failed += 1;
                    if abort {
                        if first_failure.as_ref().is_none_or(|(j, _)| i < *j) {
                            first_failure = Some((i, error));
                        }
                    } else {
                        tracing::warn!(sample = i, %error, "sample marked invalid");
                        builder.invalidate(i);
                    }
                }
            }
        }
        if let Some((sample, error)) = first_failure {
            return Err(EvalError::Sample { sample, error });
        }

        let metrics = EvaluationMetrics {
            total_us: start.elapsed().as_micros() as u64,
            validation_us,
            parallel_us,
            samples,
            replica_samples,
            failed_samples: failed,
        };
        Ok(builder.finish(
            coordinate_names,
            pipeline.plan.marker_names().to_vec(),
            metrics,
        ))
    }
}

// ── SamplePipeline ─────────────────────────────────────────────────

/// Everything resolved once per evaluation and shared read-only by
/// every worker.
struct SamplePipeline<'a> {
    trajectory: &'a Trajectory,
    bindings: ChannelBindings,
    reconciler: AccelerationReconciler,
    plan: ExtractionPlan,
}

impl<'a> SamplePipeline<'a> {
    fn prepare<M: EngineModel>(
        model: &M,
        config: &EvaluatorConfig,
        trajectory: &'a Trajectory,
        request: &EvaluationRequest,
    ) -> Result<Self, EvalError> {
        let names = trajectory.coordinate_names();
        let bindings = ChannelBindings::resolve(
            model,
            names,
            config.unknown_coordinates,
            config.locked_coordinates,
        )?;
        check_control_width(model, trajectory.controls().cols())?;
        let plan = ExtractionPlan::resolve(model, request, trajectory)?;
        let reconciler = AccelerationReconciler::new(model, names, config.acceleration_matching);
        Ok(Self {
            trajectory,
            bindings,
            reconciler,
            plan,
        })
    }

    fn run<M: EngineModel>(
        &self,
        replica: &mut Replica<M>,
        i: usize,
    ) -> Result<SampleRecord, EngineError> {
        let t = self.trajectory;
        let values = t.values().row(i);
        // Coordinates the trajectory does not name start from their defaults.
        replica.reset();
        {
            let (model, state) = replica.model_and_state();
            model.set_time(state, t.time()[i]);
        }
        self.bindings.bind(replica, values, t.speeds().row(i))?;
        {
            let (model, state) = replica.model_and_state();
            model.realize_velocity(state)?;
        }

        let mut record = SampleRecord::default();
        self.plan.angular_momentum(replica, &mut record)?;
        if i == 0 || i + 1 == t.len() {
            self.plan.mass_center_velocity(replica, &mut record)?;
        }

        let udot = self
            .reconciler
            .reconcile(replica, values, t.accelerations().row(i))?;
        apply_controls(replica, t.controls().row(i))?;
        {
            let (model, state) = replica.model_and_state();
            model.realize_dynamics(state)?;
        }
        record.forces = replica.solve(&udot)?;

        self.plan.kinematics(replica, &mut record)?;
        self.plan
            .metabolic_cost(replica, t.activations().map(|a| a.row(i)), &mut record)?;
        Ok(record)
    }
}

// ── Schedules ──────────────────────────────────────────────────────

/// Sample `i` on replica `i % replicas.len()`, one rayon task per replica.
fn run_strided<M: EngineModel>(
    replicas: &mut [Replica<M>],
    threads: &rayon::ThreadPool,
    pipeline: &SamplePipeline<'_>,
    abort: bool,
) -> Vec<Outcome> {
    let samples = pipeline.trajectory.len();
    let stride = replicas.len();
    let first_failure = AtomicUsize::new(usize::MAX);
    threads.install(|| {
        replicas
            .par_iter_mut()
            .enumerate()
            .flat_map_iter(|(r, replica)| {
                let mut out = Vec::with_capacity(samples.div_ceil(stride));
                for i in (r..samples).step_by(stride) {
                    // Each replica walks ascending indices, so nothing past
                    // the lowest known failure can change the reported one.
                    if abort && i > first_failure.load(Ordering::Relaxed) {
                        break;
                    }
                    let result = pipeline.run(replica, i);
                    if result.is_err() {
                        first_failure.fetch_min(i, Ordering::Relaxed);
                    }
                    out.push((r, i, result));
                }
                tracing::trace!(replica = r, samples = out.len(), "replica finished");
                out
            })
            .collect()
    })
}

/// Replicas pull sample indices from a shared queue.
fn run_dynamic<M: EngineModel>(
    replicas: &mut [Replica<M>],
    threads: &rayon::ThreadPool,
    pipeline: &SamplePipeline<'_>,
    abort: bool,
) -> Vec<Outcome> {
    let samples = pipeline.trajectory.len();
    let (work_tx, work_rx) = crossbeam_channel::bounded(samples);
    for i in 0..samples {
        if work_tx.send(i).is_err() {
            break;
        }
    }
    drop(work_tx);

    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    let first_failure = AtomicUsize::new(usize::MAX);
    threads.install(|| {
        rayon::scope(|s| {
            for (r, replica) in replicas.iter_mut().enumerate() {
                let work = work_rx.clone();
                let done = done_tx.clone();
                let first_failure = &first_failure;
                s.spawn(move |_| {
                    let mut count = 0usize;
                    // The queue hands out ascending indices, so every
                    // index below a failure was already taken.
                    for i in work.iter() {
                        if abort && i > first_failure.load(Ordering::Relaxed) {
                            break;
                        }
                        let result = pipeline.run(replica, i);
                        if result.is_err() {
                            first_failure.fetch_min(i, Ordering::Relaxed);
                        }
                        count += 1;
                        if done.send((r, i, result)).is_err() {
                            break;
                        }
                    }
                    tracing::trace!(replica = r, samples = count, "replica finished");
                });
            }
        });
    });
    drop(done_tx);
    done_rx.iter().collect()
}
