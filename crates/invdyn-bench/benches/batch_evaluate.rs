//! Criterion benchmarks for whole-trajectory evaluation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use invdyn_bench::{reference_profile, stress_profile, swing_trajectory};
use invdyn_engine::{EvaluationRequest, Evaluator, EvaluatorConfig, MarkerSelection, Schedule};
use invdyn_test_utils::leg;
use invdyn_tree::TreeEngine;

fn full_request() -> EvaluationRequest {
    EvaluationRequest::new()
        .with_angular_momentum()
        .with_metabolic_cost()
        .with_body_orientations([0usize, 1, 2])
        .with_mass_center_velocity()
        .with_markers(MarkerSelection::All)
}

fn bench_reference_pool_sizes(c: &mut Criterion) {
    let profile = reference_profile();
    let request = EvaluationRequest::new();
    let mut group = c.benchmark_group("reference_forces");
    for pool_size in [1usize, 4, 8, 20] {
        let config = EvaluatorConfig::default().with_pool_size(pool_size);
        let mut ev = Evaluator::new(TreeEngine, config).unwrap();
        ev.load(&profile.model).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(pool_size), &pool_size, |b, _| {
            b.iter(|| black_box(ev.evaluate(&profile.trajectory, &request).unwrap()));
        });
    }
    group.finish();
}

fn bench_reference_schedules(c: &mut Criterion) {
    let profile = reference_profile();
    let request = full_request();
    let mut group = c.benchmark_group("reference_full_request");
    for schedule in [Schedule::Strided, Schedule::Dynamic] {
        let config = EvaluatorConfig::default()
            .with_pool_size(8)
            .with_schedule(schedule);
        let mut ev = Evaluator::new(TreeEngine, config).unwrap();
        ev.load(&profile.model).unwrap();
        group.bench_function(format!("{schedule:?}"), |b| {
            b.iter(|| black_box(ev.evaluate(&profile.trajectory, &request).unwrap()));
        });
    }
    group.finish();
}

fn bench_stress(c: &mut Criterion) {
    let profile = stress_profile();
    let mut ev = Evaluator::new(TreeEngine, EvaluatorConfig::default()).unwrap();
    ev.load(&profile.model).unwrap();
    let request = EvaluationRequest::new();
    let mut group = c.benchmark_group("stress");
    group.sample_size(10);
    group.bench_function("forces_40_links_10k_samples", |b| {
        b.iter(|| black_box(ev.evaluate(&profile.trajectory, &request).unwrap()));
    });
    group.finish();
}

fn bench_pool_load(c: &mut Criterion) {
    let model = leg();
    let mut ev = Evaluator::new(TreeEngine, EvaluatorConfig::default()).unwrap();
    c.bench_function("load_leg_pool_20", |b| {
        b.iter(|| ev.load(black_box(&model)).unwrap());
    });
}

fn bench_leg_gait(c: &mut Criterion) {
    let names: Vec<String> = ["pelvis_tx", "hip", "knee"].map(String::from).to_vec();
    let trajectory = swing_trajectory(&names, 500, 3, 2);
    let mut ev = Evaluator::new(TreeEngine, EvaluatorConfig::default().with_pool_size(8)).unwrap();
    ev.load(&leg()).unwrap();
    let request = full_request();
    c.bench_function("leg_500_full_request", |b| {
        b.iter(|| black_box(ev.evaluate(&trajectory, &request).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_reference_pool_sizes,
    bench_reference_schedules,
    bench_stress,
    bench_pool_load,
    bench_leg_gait
);
criterion_main!(benches);
