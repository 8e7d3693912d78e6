//! Benchmark profiles for the invdyn batch evaluator.
//!
//! - [`chain_model`]: planar serial chain with one actuator and one
//!   muscle per link, plus a marker at every link end.
//! - [`swing_trajectory`]: deterministic smooth motion for any set of
//!   coordinate names.
//! - [`reference_profile`]: 12-link chain, 1000 samples.
//! - [`stress_profile`]: 40-link chain, 10 000 samples.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use invdyn_engine::{Table, Trajectory};
use invdyn_tree::{
    ActuatorDescription, BodyDescription, JointDescription, MarkerDescription,
    MetabolicProbeDescription, ModelDescription, MuscleDescription, GROUND,
};

/// Link length of every [`chain_model`] segment (m).
pub const LINK_LENGTH: f64 = 0.25;

/// Build an `links`-segment planar chain hanging from ground.
///
/// Coordinates are `q0 .. q{links-1}`; bodies `link0 ..`; markers
/// `end0 ..`. Panics if `links` is zero.
pub fn chain_model(links: usize) -> ModelDescription {
    assert!(links > 0, "chain needs at least one link");
    let mut bodies = Vec::with_capacity(links);
    let mut markers = Vec::with_capacity(links);
    let mut actuators = Vec::with_capacity(links);
    let mut muscles = Vec::with_capacity(links);
    for i in 0..links {
        let coordinate = format!("q{i}");
        let joint = if i == 0 {
            JointDescription::revolute(GROUND, [0.0, 0.0, 1.0], &coordinate)
        } else {
            JointDescription::revolute(&format!("link{}", i - 1), [0.0, 0.0, 1.0], &coordinate)
                .at([0.0, -LINK_LENGTH, 0.0])
        };
        bodies.push(BodyDescription {
            name: format!("link{i}"),
            mass: 1.0 + 0.1 * i as f64,
            mass_center: [0.0, -LINK_LENGTH / 2.0, 0.0],
            inertia: [0.01, 0.01, 0.005, 0.0, 0.0, 0.0],
            joint,
        });
        markers.push(MarkerDescription {
            name: format!("end{i}"),
            body: format!("link{i}"),
            location: [0.0, -LINK_LENGTH, 0.0],
        });
        actuators.push(ActuatorDescription {
            name: format!("motor{i}"),
            coordinate: coordinate.clone(),
            optimal_force: 100.0,
        });
        muscles.push(MuscleDescription {
            name: format!("muscle{i}"),
            coordinate,
            max_isometric_force: 500.0,
            moment_arm: 0.03,
            mass: 0.3,
            activation_heat_rate: 40.0,
            maintenance_heat_rate: 25.0,
        });
    }
    ModelDescription {
        name: format!("chain{links}"),
        gravity: [0.0, -9.81, 0.0],
        bodies,
        markers,
        actuators,
        muscles,
        metabolic_probe: MetabolicProbeDescription { basal_rate: 1.0 },
    }
}

/// A `samples`-long trajectory over `names` with half-activation
/// muscles and `controls` zero controls per sample.
pub fn swing_trajectory(
    names: &[String],
    samples: usize,
    controls: usize,
    muscles: usize,
) -> Trajectory {
    let dt = 0.005;
    let n = names.len();
    let mut values = Vec::with_capacity(samples * n);
    let mut speeds = Vec::with_capacity(samples * n);
    let mut accelerations = Vec::with_capacity(samples * n);
    for i in 0..samples {
        let t = i as f64 * dt;
        for k in 0..n {
            let w = 2.0 + 0.3 * k as f64;
            let phase = w * t + 0.5 * k as f64;
            values.push(0.4 * phase.sin());
            speeds.push(0.4 * w * phase.cos());
            accelerations.push(-0.4 * w * w * phase.sin());
        }
    }
    let activations = Table::from_row_major(samples, muscles, vec![0.5; samples * muscles]).unwrap();
    Trajectory::new(
        (0..samples).map(|i| i as f64 * dt).collect(),
        names.iter().cloned(),
        Table::from_row_major(samples, n, values).unwrap(),
        Table::from_row_major(samples, n, speeds).unwrap(),
        Table::from_row_major(samples, n, accelerations).unwrap(),
        Table::zeros(samples, controls),
    )
    .unwrap()
    .with_activations(activations)
    .unwrap()
}

/// Model and trajectory for one profile.
pub struct Profile {
    /// The model description.
    pub model: ModelDescription,
    /// The trajectory to evaluate.
    pub trajectory: Trajectory,
}

fn profile(links: usize, samples: usize) -> Profile {
    let model = chain_model(links);
    let names: Vec<String> = (0..links).map(|i| format!("q{i}")).collect();
    let trajectory = swing_trajectory(&names, samples, links, links);
    Profile { model, trajectory }
}

/// 12-link chain, 1000 samples.
pub fn reference_profile() -> Profile {
    profile(12, 1000)
}

/// 40-link chain, 10 000 samples.
pub fn stress_profile() -> Profile {
    profile(40, 10_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_model_validates() {
        chain_model(5).validate().unwrap();
    }

    #[test]
    fn reference_profile_shapes_agree() {
        let p = reference_profile();
        assert_eq!(p.trajectory.len(), 1000);
        assert_eq!(p.trajectory.coordinate_names().len(), 12);
        assert_eq!(p.trajectory.controls().cols(), p.model.actuators.len());
        assert_eq!(
            p.trajectory.activations().map(|a| a.cols()),
            Some(p.model.muscles.len())
        );
    }
}
