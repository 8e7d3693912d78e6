//! Reference model descriptions and sampled motions.
//!
//! - [`pendulum`]: one rod on a revolute joint, closed-form torque in
//!   [`pendulum_torque`].
//! - [`locked_double_pendulum`]: hip free, knee locked at
//!   [`LOCKED_KNEE_ANGLE`].
//! - [`two_link_arm`]: planar shoulder/elbow arm with markers, two
//!   actuators and two muscles.
//! - [`leg`]: sliding pelvis with hip and knee, for mass-center and
//!   benchmark work.
//!
//! Every model hangs along −y under gravity `[0, −g, 0]` and rotates
//! about +z.

use invdyn_tree::{
    ActuatorDescription, BodyDescription, JointDescription, MarkerDescription,
    MetabolicProbeDescription, ModelDescription, MuscleDescription, GROUND,
};

pub const PENDULUM_MASS: f64 = 1.3;
pub const PENDULUM_LENGTH: f64 = 0.7;
pub const PENDULUM_IZZ: f64 = 0.05;
pub const PENDULUM_GRAVITY: f64 = 9.81;

pub const LOCKED_KNEE_ANGLE: f64 = -0.35;

pub const ARM_UPPER_LENGTH: f64 = 0.3;
pub const ARM_FOREARM_LENGTH: f64 = 0.25;

const Z: [f64; 3] = [0.0, 0.0, 1.0];

fn gravity() -> [f64; 3] {
    [0.0, -PENDULUM_GRAVITY, 0.0]
}

fn rod(name: &str, mass: f64, length: f64, izz: f64, joint: JointDescription) -> BodyDescription {
    BodyDescription {
        name: name.into(),
        mass,
        mass_center: [0.0, -length, 0.0],
        inertia: [izz, izz, izz, 0.0, 0.0, 0.0],
        joint,
    }
}

fn marker(name: &str, body: &str, location: [f64; 3]) -> MarkerDescription {
    MarkerDescription {
        name: name.into(),
        body: body.into(),
        location,
    }
}

fn actuator(name: &str, coordinate: &str, optimal_force: f64) -> ActuatorDescription {
    ActuatorDescription {
        name: name.into(),
        coordinate: coordinate.into(),
        optimal_force,
    }
}

fn muscle(name: &str, coordinate: &str, moment_arm: f64) -> MuscleDescription {
    MuscleDescription {
        name: name.into(),
        coordinate: coordinate.into(),
        max_isometric_force: 600.0,
        moment_arm,
        mass: 0.4,
        activation_heat_rate: 40.0,
        maintenance_heat_rate: 25.0,
    }
}

/// Point-mass-plus-inertia rod swinging about `theta`.
///
/// Mass center and the `tip` marker both sit [`PENDULUM_LENGTH`] below
/// the pivot. One actuator `theta_motor` with unit optimal force.
pub fn pendulum() -> ModelDescription {
    ModelDescription {
        name: "pendulum".into(),
        gravity: gravity(),
        bodies: vec![BodyDescription {
            name: "rod".into(),
            mass: PENDULUM_MASS,
            mass_center: [0.0, -PENDULUM_LENGTH, 0.0],
            inertia: [0.0, 0.0, PENDULUM_IZZ, 0.0, 0.0, 0.0],
            joint: JointDescription::revolute(GROUND, Z, "theta"),
        }],
        markers: vec![marker("tip", "rod", [0.0, -PENDULUM_LENGTH, 0.0])],
        actuators: vec![actuator("theta_motor", "theta", 1.0)],
        muscles: vec![],
        metabolic_probe: MetabolicProbeDescription::default(),
    }
}

/// Joint torque the [`pendulum`] needs for `alpha` at `theta`, with
/// zero actuator control.
pub fn pendulum_torque(theta: f64, alpha: f64) -> f64 {
    let inertia = PENDULUM_IZZ + PENDULUM_MASS * PENDULUM_LENGTH * PENDULUM_LENGTH;
    inertia * alpha + PENDULUM_MASS * PENDULUM_GRAVITY * PENDULUM_LENGTH * theta.sin()
}

/// Thigh on `hip`, shank on `knee`; the knee is locked at
/// [`LOCKED_KNEE_ANGLE`]. One actuator on the hip.
pub fn locked_double_pendulum() -> ModelDescription {
    ModelDescription {
        name: "locked_double_pendulum".into(),
        gravity: gravity(),
        bodies: vec![
            rod(
                "thigh",
                7.0,
                0.2,
                0.1,
                JointDescription::revolute(GROUND, Z, "hip"),
            ),
            rod(
                "shank",
                3.5,
                0.2,
                0.05,
                JointDescription::revolute("thigh", Z, "knee")
                    .at([0.0, -0.4, 0.0])
                    .locked_at(LOCKED_KNEE_ANGLE),
            ),
        ],
        markers: vec![marker("ankle", "shank", [0.0, -0.4, 0.0])],
        actuators: vec![actuator("hip_motor", "hip", 100.0)],
        muscles: vec![],
        metabolic_probe: MetabolicProbeDescription::default(),
    }
}

/// Planar arm: `upper_arm` on `shoulder`, `forearm` on `elbow`.
///
/// Markers `elbow_marker` (end of the upper arm) and `wrist` (end of
/// the forearm), in that order. Actuators and muscles are listed
/// shoulder first.
pub fn two_link_arm() -> ModelDescription {
    ModelDescription {
        name: "two_link_arm".into(),
        gravity: gravity(),
        bodies: vec![
            rod(
                "upper_arm",
                2.0,
                ARM_UPPER_LENGTH / 2.0,
                0.015,
                JointDescription::revolute(GROUND, Z, "shoulder"),
            ),
            rod(
                "forearm",
                1.5,
                ARM_FOREARM_LENGTH / 2.0,
                0.008,
                JointDescription::revolute("upper_arm", Z, "elbow")
                    .at([0.0, -ARM_UPPER_LENGTH, 0.0]),
            ),
        ],
        markers: vec![
            marker("elbow_marker", "upper_arm", [0.0, -ARM_UPPER_LENGTH, 0.0]),
            marker("wrist", "forearm", [0.0, -ARM_FOREARM_LENGTH, 0.0]),
        ],
        actuators: vec![
            actuator("shoulder_motor", "shoulder", 50.0),
            actuator("elbow_motor", "elbow", 30.0),
        ],
        muscles: vec![
            muscle("deltoid", "shoulder", 0.03),
            muscle("biceps", "elbow", 0.04),
        ],
        metabolic_probe: MetabolicProbeDescription { basal_rate: 1.2 },
    }
}

/// Pelvis sliding along x (`pelvis_tx`) carrying a thigh on `hip` and a
/// shank on `knee`.
///
/// Three actuators, two muscles and a `toe` marker.
pub fn leg() -> ModelDescription {
    ModelDescription {
        name: "leg".into(),
        gravity: gravity(),
        bodies: vec![
            BodyDescription {
                name: "pelvis".into(),
                mass: 11.0,
                mass_center: [0.0; 3],
                inertia: [0.1, 0.1, 0.1, 0.0, 0.0, 0.0],
                joint: JointDescription::prismatic(GROUND, [1.0, 0.0, 0.0], "pelvis_tx")
                    .at([0.0, 0.95, 0.0]),
            },
            rod(
                "thigh",
                7.0,
                0.2,
                0.1,
                JointDescription::revolute("pelvis", Z, "hip").at([0.0, -0.08, 0.0]),
            ),
            rod(
                "shank",
                3.5,
                0.2,
                0.05,
                JointDescription::revolute("thigh", Z, "knee").at([0.0, -0.42, 0.0]),
            ),
        ],
        markers: vec![marker("toe", "shank", [0.1, -0.43, 0.0])],
        actuators: vec![
            actuator("pelvis_residual", "pelvis_tx", 10.0),
            actuator("hip_motor", "hip", 150.0),
            actuator("knee_motor", "knee", 120.0),
        ],
        muscles: vec![
            muscle("glut_max", "hip", -0.05),
            muscle("vasti", "knee", 0.045),
        ],
        metabolic_probe: MetabolicProbeDescription { basal_rate: 1.5 },
    }
}

/// Smooth sinusoidal motion sampled at a fixed step.
///
/// Coordinate `k` follows `q = a sin(w t + k)` with analytic speed and
/// acceleration. Rows are samples; columns follow `names`.
#[derive(Clone, Debug)]
pub struct SampledMotion {
    pub names: Vec<String>,
    pub time: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    pub speeds: Vec<Vec<f64>>,
    pub accelerations: Vec<Vec<f64>>,
}

impl SampledMotion {
    pub fn sinusoid(names: &[&str], samples: usize, dt: f64, amplitude: f64, omega: f64) -> Self {
        let time: Vec<f64> = (0..samples).map(|i| i as f64 * dt).collect();
        let mut values = Vec::with_capacity(samples);
        let mut speeds = Vec::with_capacity(samples);
        let mut accelerations = Vec::with_capacity(samples);
        for &t in &time {
            let phase = |k: usize| omega * t + k as f64;
            values.push(
                (0..names.len())
                    .map(|k| amplitude * phase(k).sin())
                    .collect(),
            );
            speeds.push(
                (0..names.len())
                    .map(|k| amplitude * omega * phase(k).cos())
                    .collect(),
            );
            accelerations.push(
                (0..names.len())
                    .map(|k| -amplitude * omega * omega * phase(k).sin())
                    .collect(),
            );
        }
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            time,
            values,
            speeds,
            accelerations,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
