//! Muscle activations and the whole-body metabolic probe.
//!
//! Muscles here are energetic bookkeeping only: they apply no force to
//! the tree, so inverse dynamics is unaffected by activation. Each
//! muscle contributes a heat rate
//! `mass * (activation_heat * a + maintenance_heat * a^2)` plus positive
//! mechanical work `max(0, a * max_force * moment_arm * speed)`.

use invdyn_core::{EngineError, MuscleEnergetics, MuscleIndex, Stage};

use crate::model::{check_index, require_stage, TreeModel};
use crate::state::TreeState;

impl MuscleEnergetics for TreeModel {
    fn muscle_count(&self) -> usize {
        self.muscles.len()
    }

    fn set_activation(
        &self,
        state: &mut TreeState,
        m: MuscleIndex,
        activation: f64,
    ) -> Result<(), EngineError> {
        check_index("muscle", m.0, self.muscles.len())?;
        state.activations[m.0] = activation;
        state.cap_stage(Stage::Velocity);
        Ok(())
    }

    fn equilibrate_muscles(&self, state: &mut TreeState) -> Result<(), EngineError> {
        for a in &mut state.activations {
            *a = a.clamp(0.0, 1.0);
        }
        Ok(())
    }

    fn metabolic_rate(&self, state: &TreeState) -> Result<f64, EngineError> {
        require_stage(state, Stage::Dynamics)?;
        let muscles: f64 = self
            .muscles
            .values()
            .zip(&state.activations)
            .map(|(muscle, &a)| {
                let heat = muscle.mass
                    * (muscle.activation_heat_rate * a + muscle.maintenance_heat_rate * a * a);
                let speed = state.u[muscle.coordinate.0];
                let work = a * muscle.max_isometric_force * muscle.moment_arm * speed;
                heat + work.max(0.0)
            })
            .sum();
        Ok(self.basal_rate + muscles)
    }
}
