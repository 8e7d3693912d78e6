//! Forward kinematics sweeps over the tree.

use invdyn_core::{Stage, Vec3};
use nalgebra::{Matrix3, Rotation3};

use crate::description::JointKind;
use crate::model::{Body, TreeModel};
use crate::state::TreeState;

/// World pose of a body frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Pose {
    pub(crate) rotation: Rotation3<f64>,
    pub(crate) origin: Vec3,
}

impl Pose {
    pub(crate) fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            origin: Vec3::zeros(),
        }
    }
}

/// Spatial velocity (or acceleration) of a body frame origin, in ground.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Motion {
    pub(crate) angular: Vec3,
    pub(crate) linear: Vec3,
}

impl Motion {
    pub(crate) fn zero() -> Self {
        Self {
            angular: Vec3::zeros(),
            linear: Vec3::zeros(),
        }
    }
}

fn joint_coordinate(body: &Body, values: &[f64]) -> f64 {
    body.joint.coordinate.map_or(0.0, |c| values[c.0])
}

/// Compute poses and velocities from the state's values and speeds,
/// leaving the state at [`Stage::Velocity`].
pub(crate) fn realize(model: &TreeModel, state: &mut TreeState) {
    let ground = Pose::identity();
    let still = Motion::zero();
    for (i, body) in model.bodies.values().enumerate() {
        let (parent_pose, parent_motion) = match body.parent {
            Some(p) => (state.poses[p.0], state.motion[p.0]),
            None => (ground, still),
        };
        let q = joint_coordinate(body, &state.q);
        let u = joint_coordinate(body, &state.u);
        let axis_world = parent_pose.rotation * body.joint.axis.into_inner();

        let (rotation, offset) = match body.joint.kind {
            JointKind::Revolute => (
                parent_pose.rotation * Rotation3::from_axis_angle(&body.joint.axis, q),
                body.joint.location,
            ),
            JointKind::Prismatic => (
                parent_pose.rotation,
                body.joint.location + body.joint.axis.into_inner() * q,
            ),
            JointKind::Weld => (parent_pose.rotation, body.joint.location),
        };
        let r = parent_pose.rotation * offset;
        state.poses[i] = Pose {
            rotation,
            origin: parent_pose.origin + r,
        };

        let mut motion = Motion {
            angular: parent_motion.angular,
            linear: parent_motion.linear + parent_motion.angular.cross(&r),
        };
        match body.joint.kind {
            JointKind::Revolute => motion.angular += axis_world * u,
            JointKind::Prismatic => motion.linear += axis_world * u,
            JointKind::Weld => {}
        }
        state.motion[i] = motion;
    }
    state.stage = Stage::Velocity;
}

/// Accelerations of every body origin for generalized accelerations
/// `udot`, with the ground accelerating at `-gravity` so that inertial
/// forces include weight.
pub(crate) fn accelerations(
    model: &TreeModel,
    state: &TreeState,
    udot: &[f64],
    out: &mut [Motion],
) {
    let ground = Pose::identity();
    let base = Motion {
        angular: Vec3::zeros(),
        linear: -model.gravity(),
    };
    let still = Motion::zero();
    for (i, body) in model.bodies.values().enumerate() {
        let (parent_pose, parent_vel, parent_acc) = match body.parent {
            Some(p) => (state.poses[p.0], state.motion[p.0], out[p.0]),
            None => (ground, still, base),
        };
        let u = joint_coordinate(body, &state.u);
        let ud = joint_coordinate(body, udot);
        let z = parent_pose.rotation * body.joint.axis.into_inner();
        let r = state.poses[i].origin - parent_pose.origin;
        let w = parent_vel.angular;

        let mut acc = Motion {
            angular: parent_acc.angular,
            linear: parent_acc.linear + parent_acc.angular.cross(&r) + w.cross(&w.cross(&r)),
        };
        match body.joint.kind {
            JointKind::Revolute => {
                acc.angular += z * ud + w.cross(&(z * u));
            }
            JointKind::Prismatic => {
                acc.linear += 2.0 * w.cross(&(z * u)) + z * ud;
            }
            JointKind::Weld => {}
        }
        out[i] = acc;
    }
}

/// Body-fixed X-Y-Z Euler angles of a rotation `R = Rx(a) Ry(b) Rz(c)`.
pub(crate) fn body_fixed_xyz(r: &Matrix3<f64>) -> Vec3 {
    let b = r[(0, 2)].clamp(-1.0, 1.0).asin();
    let a = (-r[(1, 2)]).atan2(r[(2, 2)]);
    let c = (-r[(0, 1)]).atan2(r[(0, 0)]);
    Vec3::new(a, b, c)
}
