//! Integration test: how trajectory inputs reach the replicas.
//!
//! Covers locked coordinates, unknown channel names, control width,
//! the value-matching acceleration modes (including the coinciding
//! value case they get wrong) and the metabolic probe.

use invdyn_engine::{
    AccelerationMatching, EvalError, EvaluationRequest, Evaluator, EvaluatorConfig,
    LockedCoordinatePolicy, MarkerSelection, OutputRecords, Table, Trajectory,
    UnknownCoordinatePolicy,
};
use invdyn_test_utils::{locked_double_pendulum, pendulum, two_link_arm, LOCKED_KNEE_ANGLE};
use invdyn_tree::{ModelDescription, TreeEngine};

const TOL: f64 = 1e-9;

fn evaluate(
    config: EvaluatorConfig,
    model: &ModelDescription,
    traj: &Trajectory,
    request: &EvaluationRequest,
) -> Result<OutputRecords, EvalError> {
    let mut ev = Evaluator::new(TreeEngine, config.with_pool_size(2))?;
    ev.load(model)?;
    ev.evaluate(traj, request)
}

fn single_sample<const N: usize>(
    names: [&str; N],
    values: [f64; N],
    speeds: [f64; N],
    accelerations: [f64; N],
    controls: &[f64],
) -> Trajectory {
    Trajectory::new(
        vec![0.0],
        names,
        Table::from_rows(&[values]).unwrap(),
        Table::from_rows(&[speeds]).unwrap(),
        Table::from_rows(&[accelerations]).unwrap(),
        Table::from_rows(&[controls]).unwrap(),
    )
    .unwrap()
}

/// `(l sin a, −l cos a)`: the end of a link of length `l` hanging at angle `a`.
fn link_end(l: f64, a: f64) -> [f64; 2] {
    [l * a.sin(), -l * a.cos()]
}

// ── Locked coordinates ─────────────────────────────────────────────

#[test]
fn locked_knee_ignores_trajectory_value() {
    let hip = 0.3;
    let traj = single_sample(["hip", "knee"], [hip, 1.0], [0.0, 2.0], [0.0, 0.0], &[0.0]);
    let request = EvaluationRequest::new().with_markers(MarkerSelection::All);
    let out = evaluate(
        EvaluatorConfig::default(),
        &locked_double_pendulum(),
        &traj,
        &request,
    )
    .unwrap();

    let knee = link_end(0.4, hip);
    let shank = link_end(0.4, hip + LOCKED_KNEE_ANGLE);
    let ankle = out.marker_positions.as_ref().unwrap();
    assert!((ankle.get(0, 0).unwrap() - (knee[0] + shank[0])).abs() < TOL);
    assert!((ankle.get(0, 1).unwrap() - (knee[1] + shank[1])).abs() < TOL);
}

#[test]
fn overwrite_policy_moves_locked_knee() {
    let hip = 0.3;
    let traj = single_sample(["hip", "knee"], [hip, 1.0], [0.0, 0.0], [0.0, 0.0], &[0.0]);
    let request = EvaluationRequest::new().with_markers(MarkerSelection::All);
    let out = evaluate(
        EvaluatorConfig::default().with_locked_coordinates(LockedCoordinatePolicy::Overwrite),
        &locked_double_pendulum(),
        &traj,
        &request,
    )
    .unwrap();

    let knee = link_end(0.4, hip);
    let shank = link_end(0.4, hip + 1.0);
    let ankle = out.marker_positions.as_ref().unwrap();
    assert!((ankle.get(0, 0).unwrap() - (knee[0] + shank[0])).abs() < TOL);
}

// ── Unknown names and widths ───────────────────────────────────────

#[test]
fn unknown_coordinate_rejected_before_any_sample() {
    let traj = single_sample(["theta", "phi"], [0.0; 2], [0.0; 2], [0.0; 2], &[0.0]);
    let err = evaluate(
        EvaluatorConfig::default(),
        &pendulum(),
        &traj,
        &EvaluationRequest::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        EvalError::UnknownCoordinate {
            name: "phi".into(),
            column: 1
        }
    );
}

#[test]
fn unknown_coordinate_ignored_when_configured() {
    let traj = single_sample(["phi", "theta"], [9.0, 0.5], [0.0; 2], [4.0, 1.0], &[0.0]);
    let out = evaluate(
        EvaluatorConfig::default().with_unknown_coordinates(UnknownCoordinatePolicy::Ignore),
        &pendulum(),
        &traj,
        &EvaluationRequest::new(),
    )
    .unwrap();
    let expected = invdyn_test_utils::pendulum_torque(0.5, 1.0);
    assert!((out.generalized_forces.get(0, 0).unwrap() - expected).abs() < 1e-6);
}

#[test]
fn short_control_vector_rejected() {
    let traj = Trajectory::new(
        vec![0.0, 0.1],
        ["shoulder", "elbow"],
        Table::zeros(2, 2),
        Table::zeros(2, 2),
        Table::zeros(2, 2),
        Table::zeros(2, 1),
    )
    .unwrap();
    let err = evaluate(
        EvaluatorConfig::default(),
        &two_link_arm(),
        &traj,
        &EvaluationRequest::new(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        EvalError::DimensionMismatch {
            what: "controls",
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn unknown_body_and_marker_rejected() {
    let traj = single_sample(["theta"], [0.0], [0.0], [0.0], &[0.0]);
    let err = evaluate(
        EvaluatorConfig::default(),
        &pendulum(),
        &traj,
        &EvaluationRequest::new().with_body_orientations(["femur"]),
    )
    .unwrap_err();
    assert!(matches!(err, EvalError::UnknownBody { .. }));

    let err = evaluate(
        EvaluatorConfig::default(),
        &pendulum(),
        &traj,
        &EvaluationRequest::new().with_markers(MarkerSelection::Named(vec!["heel".into()])),
    )
    .unwrap_err();
    assert_eq!(err, EvalError::UnknownMarker { name: "heel".into() });
}

// ── Acceleration matching ──────────────────────────────────────────

fn forces(matching: AccelerationMatching, traj: &Trajectory) -> Vec<f64> {
    let out = evaluate(
        EvaluatorConfig::default().with_acceleration_matching(matching),
        &two_link_arm(),
        traj,
        &EvaluationRequest::new(),
    )
    .unwrap();
    out.generalized_forces.row(0)
}

#[test]
fn value_modes_agree_with_names_for_distinct_values() {
    // External order is the reverse of native [shoulder, elbow].
    let traj = single_sample(
        ["elbow", "shoulder"],
        [0.7, -0.2],
        [0.1, 0.3],
        [2.0, -1.5],
        &[0.0, 0.0],
    );
    let by_name = forces(AccelerationMatching::ByName, &traj);
    let tolerance = forces(AccelerationMatching::value_tolerance(), &traj);
    let exact = forces(AccelerationMatching::ExactValue, &traj);
    assert_eq!(by_name, tolerance);
    assert_eq!(by_name, exact);
}

#[test]
fn coinciding_values_share_one_acceleration() {
    let traj = single_sample(
        ["elbow", "shoulder"],
        [0.3, 0.3],
        [0.0, 0.0],
        [2.0, 1.0],
        &[0.0, 0.0],
    );
    let by_name = forces(AccelerationMatching::ByName, &traj);

    // Tolerance matching keeps the last matching column: shoulder's 1.0 for both.
    let last = single_sample(
        ["elbow", "shoulder"],
        [0.3, 0.3],
        [0.0, 0.0],
        [1.0, 1.0],
        &[0.0, 0.0],
    );
    let tolerance = forces(AccelerationMatching::value_tolerance(), &traj);
    assert_eq!(tolerance, forces(AccelerationMatching::ByName, &last));
    assert_ne!(tolerance, by_name);

    // Exact matching keeps the first: elbow's 2.0 for both.
    let first = single_sample(
        ["elbow", "shoulder"],
        [0.3, 0.3],
        [0.0, 0.0],
        [2.0, 2.0],
        &[0.0, 0.0],
    );
    let exact = forces(AccelerationMatching::ExactValue, &traj);
    assert_eq!(exact, forces(AccelerationMatching::ByName, &first));
}

#[test]
fn exact_value_zero_coordinate_gets_no_acceleration() {
    let traj = single_sample(
        ["shoulder", "elbow"],
        [0.0, 0.4],
        [0.0, 0.0],
        [3.0, -2.0],
        &[0.0, 0.0],
    );
    let zeroed = single_sample(
        ["shoulder", "elbow"],
        [0.0, 0.4],
        [0.0, 0.0],
        [0.0, -2.0],
        &[0.0, 0.0],
    );
    assert_eq!(
        forces(AccelerationMatching::ExactValue, &traj),
        forces(AccelerationMatching::ByName, &zeroed)
    );
}

#[test]
fn unmatched_native_coordinate_gets_zero_acceleration() {
    // Only the elbow channel is supplied; the shoulder stays at its default.
    let traj = single_sample(["elbow"], [0.5], [0.0], [1.0], &[0.0, 0.0]);
    let full = single_sample(
        ["shoulder", "elbow"],
        [0.0, 0.5],
        [0.0, 0.0],
        [0.0, 1.0],
        &[0.0, 0.0],
    );
    assert_eq!(
        forces(AccelerationMatching::ByName, &traj),
        forces(AccelerationMatching::ByName, &full)
    );
}

// ── Metabolic probe ────────────────────────────────────────────────

#[test]
fn metabolic_rate_sums_heat_work_and_basal() {
    let traj = Trajectory::new(
        vec![0.0, 0.01],
        ["shoulder", "elbow"],
        Table::zeros(2, 2),
        Table::from_rows(&[[0.0, 2.0], [0.0, 2.0]]).unwrap(),
        Table::zeros(2, 2),
        Table::zeros(2, 2),
    )
    .unwrap()
    .with_activations(Table::from_rows(&[[0.5, 1.0], [1.5, -0.2]]).unwrap())
    .unwrap();
    let out = evaluate(
        EvaluatorConfig::default(),
        &two_link_arm(),
        &traj,
        &EvaluationRequest::new().with_metabolic_cost(),
    )
    .unwrap();
    let rate = out.metabolic_cost.as_ref().unwrap();

    // deltoid: 0.4 * (40 * 0.5 + 25 * 0.25) = 10.5
    // biceps:  0.4 * (40 + 25) + 1.0 * 600 * 0.04 * 2.0 = 74
    assert!((rate.get(0, 0).unwrap() - (1.2 + 10.5 + 74.0)).abs() < TOL);
    // Activations clamp to [0, 1]: deltoid at 1, biceps silent.
    assert!((rate.get(1, 0).unwrap() - (1.2 + 26.0)).abs() < TOL);
}

#[test]
fn metabolic_cost_without_activations_rejected() {
    let traj = single_sample(["shoulder", "elbow"], [0.0; 2], [0.0; 2], [0.0; 2], &[0.0; 2]);
    let err = evaluate(
        EvaluatorConfig::default(),
        &two_link_arm(),
        &traj,
        &EvaluationRequest::new().with_metabolic_cost(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        EvalError::DimensionMismatch {
            what: "activations",
            expected: 2,
            actual: 0
        }
    );
}
