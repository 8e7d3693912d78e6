//! The replica pool.
//!
//! A [`ReplicaPool`] owns exactly `pool_size` independent [`Replica`]s
//! built from one model description, plus a rayon thread pool with one
//! worker per replica. Replicas never share state: during evaluation
//! each worker holds `&mut Replica` exclusively, which is what makes
//! engines with non-reentrant per-model caches safe to run in parallel.

use std::time::Instant;

use invdyn_core::{Engine, EngineError, InverseDynamicsSolver, ModelLoadError, MultibodyModel};
use rayon::prelude::*;

use crate::config::validate_pool_size;
use crate::error::EvalError;

// ── Replica ────────────────────────────────────────────────────────

/// One model, its state, and a solver bound to that model.
///
/// The state from `init_state` is kept so every sample can start from
/// it regardless of what the replica ran before.
pub struct Replica<M: MultibodyModel> {
    pub(crate) model: M,
    pub(crate) state: M::State,
    pub(crate) solver: M::Solver,
    initial: M::State,
}

impl<M: MultibodyModel> Replica<M> {
    /// Build a replica from an already-loaded model.
    pub fn new(model: M) -> Result<Self, ModelLoadError> {
        let initial = model.init_state()?;
        let solver = model.make_solver();
        Ok(Self {
            model,
            state: initial.clone(),
            solver,
            initial,
        })
    }

    /// Restore the state built at load time: default values, speeds,
    /// controls and activations.
    pub fn reset(&mut self) {
        self.state.clone_from(&self.initial);
    }

    /// The replica's model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The replica's state.
    pub fn state(&self) -> &M::State {
        &self.state
    }

    /// The model and a mutable borrow of the state.
    pub fn model_and_state(&mut self) -> (&M, &mut M::State) {
        (&self.model, &mut self.state)
    }

    /// Run the inverse-dynamics solve at the current state.
    pub fn solve(&mut self, udot: &[f64]) -> Result<Vec<f64>, EngineError> {
        self.solver.solve(&self.model, &self.state, udot)
    }
}

// ── ReplicaPool ────────────────────────────────────────────────────

/// A fixed-size set of replicas and the worker threads that drive them.
pub struct ReplicaPool<M: MultibodyModel> {
    replicas: Vec<Replica<M>>,
    threads: rayon::ThreadPool,
}

impl<M: MultibodyModel> ReplicaPool<M> {
    /// Build `pool_size` replicas of `description` with `engine`.
    ///
    /// Replicas are constructed in parallel on the pool's own workers.
    /// Either every replica is built or the call fails and nothing is
    /// kept.
    ///
    /// # Errors
    ///
    /// [`EvalError::Config`] for an out-of-range pool size,
    /// [`EvalError::ThreadPool`] if the workers cannot be spawned, and
    /// [`EvalError::ModelLoad`] if any replica fails to load.
    pub fn build<E>(
        engine: &E,
        description: &E::Description,
        pool_size: usize,
    ) -> Result<Self, EvalError>
    where
        E: Engine<Model = M>,
    {
        validate_pool_size(pool_size)?;
        let start = Instant::now();
        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size)
            .thread_name(|i| format!("invdyn-replica-{i}"))
            .build()
            .map_err(|e| EvalError::ThreadPool {
                reason: e.to_string(),
            })?;

        let replicas = threads.install(|| {
            (0..pool_size)
                .into_par_iter()
                .map(|_| engine.load_model(description).and_then(Replica::new))
                .collect::<Result<Vec<_>, ModelLoadError>>()
        })?;

        let name = replicas.first().map_or("", |r| r.model.name());
        tracing::debug!(
            model = name,
            replicas = pool_size,
            elapsed_us = start.elapsed().as_micros() as u64,
            "replica pool built"
        );
        Ok(Self { replicas, threads })
    }

    /// Number of replicas.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Whether the pool has no replicas. Never true for a built pool.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Replica `i`.
    pub fn replica(&self, i: usize) -> Option<&Replica<M>> {
        self.replicas.get(i)
    }

    /// Mutable replica `i`.
    pub fn replica_mut(&mut self, i: usize) -> Option<&mut Replica<M>> {
        self.replicas.get_mut(i)
    }

    /// All replicas.
    pub fn replicas(&self) -> &[Replica<M>] {
        &self.replicas
    }

    /// The model every replica was built from (replica 0's copy).
    pub fn model(&self) -> Option<&M> {
        self.replicas.first().map(|r| &r.model)
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.threads.current_num_threads()
    }

    pub(crate) fn split_mut(&mut self) -> (&mut [Replica<M>], &rayon::ThreadPool) {
        (&mut self.replicas, &self.threads)
    }
}
