//! Per-replica simulation state and realization.

use invdyn_core::{ControlInput, CoordinateAccess, EngineError, Realization, Stage};

use crate::kinematics::{self, Motion, Pose};
use crate::model::TreeModel;

/// Mutable state of one [`TreeModel`] replica.
///
/// Holds inputs (time, coordinate values and speeds, controls,
/// activations) and the cached results of realization. Writing an
/// input invalidates the caches that depend on it; see
/// [`Stage`] for the rules.
#[derive(Clone, Debug)]
pub struct TreeState {
    pub(crate) time: f64,
    pub(crate) q: Vec<f64>,
    pub(crate) u: Vec<f64>,
    pub(crate) controls: Vec<f64>,
    pub(crate) controls_valid: bool,
    pub(crate) activations: Vec<f64>,
    pub(crate) stage: Stage,
    pub(crate) poses: Vec<Pose>,
    pub(crate) motion: Vec<Motion>,
    /// Actuator generalized forces, native coordinate order.
    pub(crate) applied: Vec<f64>,
}

impl TreeState {
    pub(crate) fn new(model: &TreeModel) -> Self {
        let n = model.coordinate_count();
        let nb = model.bodies.len();
        Self {
            time: 0.0,
            q: model.coordinates.values().map(|c| c.default_value).collect(),
            u: model.coordinates.values().map(|c| c.default_speed).collect(),
            controls: vec![0.0; model.actuators.len()],
            controls_valid: false,
            activations: vec![0.0; model.muscles.len()],
            stage: Stage::Time,
            poses: vec![Pose::identity(); nb],
            motion: vec![Motion::zero(); nb],
            applied: vec![0.0; n],
        }
    }

    /// Current time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Coordinate values, native order.
    pub fn values(&self) -> &[f64] {
        &self.q
    }

    /// Coordinate speeds, native order.
    pub fn speeds(&self) -> &[f64] {
        &self.u
    }

    /// Current control vector.
    pub fn controls(&self) -> &[f64] {
        &self.controls
    }

    /// Current muscle activations.
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Realization stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn cap_stage(&mut self, stage: Stage) {
        self.stage = self.stage.min(stage);
    }
}

impl Realization for TreeModel {
    fn stage(&self, state: &TreeState) -> Stage {
        state.stage
    }

    fn realize_velocity(&self, state: &mut TreeState) -> Result<(), EngineError> {
        if state.stage < Stage::Velocity {
            kinematics::realize(self, state);
        }
        Ok(())
    }

    fn realize_dynamics(&self, state: &mut TreeState) -> Result<(), EngineError> {
        if !state.controls_valid {
            return Err(EngineError::ControlsNotValid);
        }
        self.realize_velocity(state)?;
        state.applied.fill(0.0);
        for (actuator, control) in self.actuators.iter().zip(&state.controls) {
            state.applied[actuator.coordinate.0] += control * actuator.optimal_force;
        }
        state.stage = Stage::Dynamics;
        Ok(())
    }
}

impl ControlInput for TreeModel {
    fn control_count(&self) -> usize {
        self.actuators.len()
    }

    fn set_controls(&self, state: &mut TreeState, controls: &[f64]) -> Result<(), EngineError> {
        if controls.len() != self.actuators.len() {
            return Err(EngineError::DimensionMismatch {
                what: "controls",
                expected: self.actuators.len(),
                actual: controls.len(),
            });
        }
        state.controls.copy_from_slice(controls);
        state.controls_valid = false;
        state.cap_stage(Stage::Velocity);
        Ok(())
    }

    fn mark_controls_valid(&self, state: &mut TreeState) {
        state.controls_valid = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{
        ActuatorDescription, BodyDescription, JointDescription, ModelDescription, GROUND,
    };
    use invdyn_core::{CoordinateIndex, MultibodyModel};

    fn slider() -> TreeModel {
        let desc = ModelDescription {
            name: "slider".into(),
            gravity: [0.0, 0.0, 0.0],
            bodies: vec![BodyDescription {
                name: "cart".into(),
                mass: 2.0,
                mass_center: [0.0; 3],
                inertia: [0.1, 0.1, 0.1, 0.0, 0.0, 0.0],
                joint: JointDescription::prismatic(GROUND, [1.0, 0.0, 0.0], "x"),
            }],
            markers: vec![],
            actuators: vec![
                ActuatorDescription {
                    name: "push".into(),
                    coordinate: "x".into(),
                    optimal_force: 10.0,
                },
                ActuatorDescription {
                    name: "assist".into(),
                    coordinate: "x".into(),
                    optimal_force: 1.0,
                },
            ],
            muscles: vec![],
            metabolic_probe: Default::default(),
        };
        TreeModel::from_description(&desc).unwrap()
    }

    #[test]
    fn init_state_uses_defaults_and_realizes_velocity() {
        let model = slider();
        let state = model.init_state().unwrap();
        assert_eq!(state.values(), &[0.0]);
        assert_eq!(state.stage(), Stage::Velocity);
        assert_eq!(state.controls(), &[0.0, 0.0]);
    }

    #[test]
    fn dynamics_requires_valid_controls() {
        let model = slider();
        let mut state = model.init_state().unwrap();
        model.set_controls(&mut state, &[0.5, 1.0]).unwrap();
        assert_eq!(
            model.realize_dynamics(&mut state),
            Err(EngineError::ControlsNotValid)
        );
        model.mark_controls_valid(&mut state);
        model.realize_dynamics(&mut state).unwrap();
        assert_eq!(state.stage(), Stage::Dynamics);
        assert_eq!(state.applied, vec![6.0]);
    }

    #[test]
    fn setting_controls_invalidates_dynamics() {
        let model = slider();
        let mut state = model.init_state().unwrap();
        model.set_controls(&mut state, &[0.0, 0.0]).unwrap();
        model.mark_controls_valid(&mut state);
        model.realize_dynamics(&mut state).unwrap();
        model.set_controls(&mut state, &[1.0, 0.0]).unwrap();
        assert_eq!(state.stage(), Stage::Velocity);
        assert!(!state.controls_valid);
    }

    #[test]
    fn wrong_control_length_leaves_state_untouched() {
        let model = slider();
        let mut state = model.init_state().unwrap();
        let err = model.set_controls(&mut state, &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(state.controls(), &[0.0, 0.0]);
        assert_eq!(state.stage(), Stage::Velocity);
    }

    #[test]
    fn realize_after_write_recomputes_pose() {
        let model = slider();
        let mut state = model.init_state().unwrap();
        model.set_value(&mut state, CoordinateIndex(0), 1.5).unwrap();
        model.realize_velocity(&mut state).unwrap();
        assert!((state.poses[0].origin.x - 1.5).abs() < 1e-12);
    }
}
