//! Recursive Newton–Euler inverse dynamics and system momentum.
//!
//! The solve runs two sweeps over the parent-first body list:
//!
//! 1. **Forward**: body-origin accelerations from the state's speeds and
//!    the requested generalized accelerations, with the ground
//!    accelerating at `-gravity`.
//! 2. **Backward**: each body's inertial force and moment (about its
//!    origin) are accumulated into its parent, and the joint's share is
//!    projected onto the joint axis.
//!
//! The result is the generalized force the joints must supply, net of
//! the actuator forces realized at [`Stage::Dynamics`].

use invdyn_core::{
    EngineError, InverseDynamicsSolver, MomentumQueries, SolveError, Stage, Vec3,
};

use crate::description::JointKind;
use crate::kinematics::{self, Motion};
use crate::model::{require_stage, TreeModel};
use crate::state::TreeState;

/// Inverse-dynamics solver with reusable scratch buffers.
#[derive(Clone, Debug)]
pub struct TreeSolver {
    acc: Vec<Motion>,
    force: Vec<Vec3>,
    moment: Vec<Vec3>,
}

impl TreeSolver {
    pub(crate) fn new(model: &TreeModel) -> Self {
        let nb = model.bodies.len();
        Self {
            acc: vec![Motion::zero(); nb],
            force: vec![Vec3::zeros(); nb],
            moment: vec![Vec3::zeros(); nb],
        }
    }
}

impl InverseDynamicsSolver<TreeModel> for TreeSolver {
    fn solve(
        &mut self,
        model: &TreeModel,
        state: &TreeState,
        udot: &[f64],
    ) -> Result<Vec<f64>, EngineError> {
        require_stage(state, Stage::Dynamics)?;
        let n = model.coordinates.len();
        if udot.len() != n {
            return Err(EngineError::DimensionMismatch {
                what: "accelerations",
                expected: n,
                actual: udot.len(),
            });
        }
        let nb = model.bodies.len();
        if self.acc.len() != nb {
            *self = Self::new(model);
        }

        kinematics::accelerations(model, state, udot, &mut self.acc);

        for (i, body) in model.bodies.values().enumerate() {
            let rot = state.poses[i].rotation;
            let w = state.motion[i].angular;
            let acc = self.acc[i];
            let d = rot * body.mass_center;
            let a_c = acc.linear + acc.angular.cross(&d) + w.cross(&w.cross(&d));
            let inertia_w = rot.matrix() * body.inertia * rot.matrix().transpose();
            let f = a_c * body.mass;
            let n_c = inertia_w * acc.angular + w.cross(&(inertia_w * w));
            self.force[i] = f;
            self.moment[i] = n_c + d.cross(&f);
        }

        let mut tau = vec![0.0; n];
        for (i, body) in model.bodies.values().enumerate().rev() {
            let f = self.force[i];
            let m = self.moment[i];
            if let Some(c) = body.joint.coordinate {
                let parent_rot = body
                    .parent
                    .map_or_else(nalgebra::Rotation3::identity, |p| state.poses[p.0].rotation);
                let z = parent_rot * body.joint.axis.into_inner();
                tau[c.0] = match body.joint.kind {
                    JointKind::Revolute => z.dot(&m),
                    JointKind::Prismatic => z.dot(&f),
                    JointKind::Weld => 0.0,
                };
            }
            if let Some(p) = body.parent {
                let r = state.poses[i].origin - state.poses[p.0].origin;
                self.force[p.0] += f;
                self.moment[p.0] += m + r.cross(&f);
            }
        }

        for (c, (t, applied)) in tau.iter_mut().zip(&state.applied).enumerate() {
            *t -= applied;
            if !t.is_finite() {
                return Err(SolveError::NonFinite { coordinate: c }.into());
            }
        }
        Ok(tau)
    }
}

impl MomentumQueries for TreeModel {
    fn central_angular_momentum(&self, state: &TreeState) -> Result<Vec3, EngineError> {
        require_stage(state, Stage::Velocity)?;
        let (com, com_vel) = mass_center(self, state);
        let mut h = Vec3::zeros();
        for (i, body) in self.bodies.values().enumerate() {
            let rot = state.poses[i].rotation;
            let w = state.motion[i].angular;
            let d = rot * body.mass_center;
            let c = state.poses[i].origin + d;
            let v = state.motion[i].linear + w.cross(&d);
            let inertia_w = rot.matrix() * body.inertia * rot.matrix().transpose();
            h += inertia_w * w + (c - com).cross(&(v - com_vel)) * body.mass;
        }
        Ok(h)
    }

    fn mass_center_velocity(&self, state: &TreeState) -> Result<Vec3, EngineError> {
        require_stage(state, Stage::Velocity)?;
        Ok(mass_center(self, state).1)
    }
}

/// System mass-center position and velocity.
fn mass_center(model: &TreeModel, state: &TreeState) -> (Vec3, Vec3) {
    let mut p = Vec3::zeros();
    let mut v = Vec3::zeros();
    for (i, body) in model.bodies.values().enumerate() {
        let rot = state.poses[i].rotation;
        let d = rot * body.mass_center;
        p += (state.poses[i].origin + d) * body.mass;
        v += (state.motion[i].linear + state.motion[i].angular.cross(&d)) * body.mass;
    }
    (p / model.total_mass, v / model.total_mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{
        ActuatorDescription, BodyDescription, JointDescription, ModelDescription, GROUND,
    };
    use invdyn_core::{
        ControlInput, CoordinateAccess, CoordinateIndex, MultibodyModel, Realization,
    };
    use proptest::prelude::*;

    const G: f64 = 9.81;

    fn pendulum(mass: f64, length: f64, izz: f64) -> TreeModel {
        let desc = ModelDescription {
            name: "pendulum".into(),
            gravity: [0.0, -G, 0.0],
            bodies: vec![BodyDescription {
                name: "rod".into(),
                mass,
                mass_center: [0.0, -length, 0.0],
                inertia: [0.0, 0.0, izz, 0.0, 0.0, 0.0],
                joint: JointDescription::revolute(GROUND, [0.0, 0.0, 1.0], "theta"),
            }],
            markers: vec![],
            actuators: vec![ActuatorDescription {
                name: "motor".into(),
                coordinate: "theta".into(),
                optimal_force: 1.0,
            }],
            muscles: vec![],
            metabolic_probe: Default::default(),
        };
        TreeModel::from_description(&desc).unwrap()
    }

    fn prepared(model: &TreeModel, q: &[f64], u: &[f64], controls: &[f64]) -> TreeState {
        let mut state = model.init_state().unwrap();
        for (i, (&qi, &ui)) in q.iter().zip(u).enumerate() {
            model.set_value(&mut state, CoordinateIndex(i), qi).unwrap();
            model.set_speed(&mut state, CoordinateIndex(i), ui).unwrap();
        }
        model.realize_velocity(&mut state).unwrap();
        model.set_controls(&mut state, controls).unwrap();
        model.mark_controls_valid(&mut state);
        model.realize_dynamics(&mut state).unwrap();
        state
    }

    proptest! {
        #[test]
        fn pendulum_matches_closed_form(
            theta in -3.0f64..3.0,
            speed in -5.0f64..5.0,
            accel in -20.0f64..20.0,
        ) {
            let (m, l, izz) = (1.3, 0.7, 0.05);
            let model = pendulum(m, l, izz);
            let state = prepared(&model, &[theta], &[speed], &[0.0]);
            let mut solver = model.make_solver();
            let tau = solver.solve(&model, &state, &[accel]).unwrap();
            let expected = (izz + m * l * l) * accel + m * G * l * theta.sin();
            prop_assert!((tau[0] - expected).abs() < 1e-9, "{} vs {}", tau[0], expected);
        }
    }

    #[test]
    fn actuator_force_is_subtracted() {
        let model = pendulum(1.0, 1.0, 0.0);
        let state = prepared(&model, &[0.0], &[0.0], &[2.5]);
        let tau = model.make_solver().solve(&model, &state, &[1.0]).unwrap();
        assert!((tau[0] - (1.0 - 2.5)).abs() < 1e-12);
    }

    #[test]
    fn solve_requires_dynamics_stage() {
        let model = pendulum(1.0, 1.0, 0.0);
        let state = model.init_state().unwrap();
        let err = model.make_solver().solve(&model, &state, &[0.0]).unwrap_err();
        assert_eq!(
            err,
            EngineError::Stage {
                required: Stage::Dynamics,
                current: Stage::Velocity
            }
        );
    }

    #[test]
    fn wrong_acceleration_length_rejected() {
        let model = pendulum(1.0, 1.0, 0.0);
        let state = prepared(&model, &[0.0], &[0.0], &[0.0]);
        let err = model
            .make_solver()
            .solve(&model, &state, &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn nan_acceleration_reports_non_finite() {
        let model = pendulum(1.0, 1.0, 0.0);
        let state = prepared(&model, &[0.0], &[0.0], &[0.0]);
        let err = model
            .make_solver()
            .solve(&model, &state, &[f64::NAN])
            .unwrap_err();
        assert_eq!(err, EngineError::Solve(SolveError::NonFinite { coordinate: 0 }));
    }

    #[test]
    fn hanging_double_pendulum_elbow_carries_lower_weight() {
        // Horizontal two-link arm at rest: the shoulder holds both links,
        // the elbow only the lower one.
        let link = |name: &str, parent: &str, coord: &str, at: [f64; 3]| BodyDescription {
            name: name.into(),
            mass: 2.0,
            mass_center: [0.5, 0.0, 0.0],
            inertia: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            joint: JointDescription::revolute(parent, [0.0, 0.0, 1.0], coord).at(at),
        };
        let desc = ModelDescription {
            name: "arm".into(),
            gravity: [0.0, -G, 0.0],
            bodies: vec![
                link("upper", GROUND, "shoulder", [0.0; 3]),
                link("lower", "upper", "elbow", [1.0, 0.0, 0.0]),
            ],
            markers: vec![],
            actuators: vec![],
            muscles: vec![],
            metabolic_probe: Default::default(),
        };
        let model = TreeModel::from_description(&desc).unwrap();
        let state = prepared(&model, &[0.0, 0.0], &[0.0, 0.0], &[]);
        let tau = model.make_solver().solve(&model, &state, &[0.0, 0.0]).unwrap();
        let elbow = 2.0 * G * 0.5;
        let shoulder = 2.0 * G * 0.5 + 2.0 * G * 1.5;
        assert!((tau[1] - elbow).abs() < 1e-9, "elbow {}", tau[1]);
        assert!((tau[0] - shoulder).abs() < 1e-9, "shoulder {}", tau[0]);
    }

    #[test]
    fn spinning_pendulum_momentum_and_mass_center() {
        let (m, l, izz) = (2.0, 0.5, 0.1);
        let model = pendulum(m, l, izz);
        let state = prepared(&model, &[0.0], &[3.0], &[0.0]);
        // Single body: central momentum is the body's own spin.
        let h = model.central_angular_momentum(&state).unwrap();
        assert!((h - Vec3::new(0.0, 0.0, izz * 3.0)).norm() < 1e-12, "got {h}");
        // Mass center at (0, -l) moving at u*l along +x.
        let v = model.mass_center_velocity(&state).unwrap();
        assert!((v - Vec3::new(3.0 * l, 0.0, 0.0)).norm() < 1e-12, "got {v}");
    }
}
