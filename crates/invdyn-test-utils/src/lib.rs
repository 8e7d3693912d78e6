//! Test fixtures for invdyn development.
//!
//! Provides reference model descriptions with known closed-form
//! dynamics (see [`fixtures`]), sampled motions to drive them, and a
//! [`FlakyEngine`] wrapper that fails model construction on demand.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    leg, locked_double_pendulum, pendulum, pendulum_torque, two_link_arm, SampledMotion,
    ARM_FOREARM_LENGTH, ARM_UPPER_LENGTH, LOCKED_KNEE_ANGLE, PENDULUM_GRAVITY, PENDULUM_IZZ,
    PENDULUM_LENGTH, PENDULUM_MASS,
};

use std::sync::atomic::{AtomicUsize, Ordering};

use invdyn_core::{Engine, ModelLoadError};

/// Wraps an engine and fails every model load from the `n`th on.
///
/// Loads are counted across the wrapper's lifetime, so a pool of four
/// replicas with `fail_load_after(2)` builds two models and then fails.
pub struct FlakyEngine<E> {
    inner: E,
    fail_after: usize,
    loads: AtomicUsize,
}

impl<E> FlakyEngine<E> {
    /// Wrap `inner`; never fails until configured.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            fail_after: usize::MAX,
            loads: AtomicUsize::new(0),
        }
    }

    /// Fail loads once `n` have been attempted.
    pub fn fail_load_after(mut self, n: usize) -> Self {
        self.fail_after = n;
        self
    }

    /// Number of loads attempted so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<E: Engine> Engine for FlakyEngine<E> {
    type Description = E::Description;
    type Model = E::Model;

    fn load_model(&self, description: &Self::Description) -> Result<Self::Model, ModelLoadError> {
        let n = self.loads.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after {
            return Err(ModelLoadError::InitialState {
                reason: format!("injected failure on load {n}"),
            });
        }
        self.inner.load_model(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invdyn_tree::TreeEngine;

    #[test]
    fn flaky_engine_counts_loads() {
        let engine = FlakyEngine::new(TreeEngine).fail_load_after(1);
        assert!(engine.load_model(&pendulum()).is_ok());
        assert!(matches!(
            engine.load_model(&pendulum()),
            Err(ModelLoadError::InitialState { .. })
        ));
        assert_eq!(engine.loads(), 2);
    }

    #[test]
    fn fixtures_validate() {
        for desc in [pendulum(), locked_double_pendulum(), two_link_arm(), leg()] {
            desc.validate().unwrap();
        }
    }
}
