// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Simulation Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the per-timestep metric computation and
//! full 100-step runs in both update modes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rcd_dynamics::rng::standard_normals;
use rcd_dynamics::seeded;
use rcd_engine::SimulationEngine;
use rcd_metrics::Metrics;
use rcd_types::{InjectionSchedule, Manifold, SimulationConfig, UpdateMode};

fn random_square(n: usize, seed: u64) -> Manifold {
    let mut rng = seeded(seed);
    Manifold::square(n, standard_normals(&mut rng, n * n)).unwrap()
}

fn random_vector(n: usize, seed: u64) -> Manifold {
    let mut rng = seeded(seed);
    Manifold::vector(standard_normals(&mut rng, n))
}

// ── Metrics::compute() ──────────────────────────────────────────────

fn bench_metrics_vector_20(c: &mut Criterion) {
    let h = random_vector(20, 1);
    let m = random_vector(20, 2);
    c.bench_function("metrics_vector_20", |b| {
        b.iter(|| Metrics::compute(black_box(&h), black_box(&m)))
    });
}

fn bench_metrics_matrix_10(c: &mut Criterion) {
    let h = random_square(10, 1);
    let m = random_square(10, 2);
    c.bench_function("metrics_matrix_10x10", |b| {
        b.iter(|| Metrics::compute(black_box(&h), black_box(&m)))
    });
}

fn bench_metrics_matrix_20(c: &mut Criterion) {
    let h = random_square(20, 1);
    let m = random_square(20, 2);
    c.bench_function("metrics_matrix_20x20", |b| {
        b.iter(|| Metrics::compute(black_box(&h), black_box(&m)))
    });
}

// ── SimulationEngine.run(100) ───────────────────────────────────────

fn run_100(config: &SimulationConfig) -> usize {
    let mut engine = match SimulationEngine::new(config.clone(), InjectionSchedule::new()) {
        Ok(e) => e,
        Err(_) => return 0,
    };
    if engine.initialize().is_err() {
        return 0;
    }
    engine.run(100).map(|s| s.len()).unwrap_or(0)
}

fn bench_run_linear_100(c: &mut Criterion) {
    let config = SimulationConfig::default();
    c.bench_function("run_linear_100", |b| b.iter(|| run_100(black_box(&config))));
}

fn bench_run_matrix_100(c: &mut Criterion) {
    let config = SimulationConfig {
        mode: UpdateMode::MatrixCoupled,
        n_dimensions: 5,
        ..Default::default()
    };
    c.bench_function("run_matrix_5x5_100", |b| b.iter(|| run_100(black_box(&config))));
}

criterion_group!(
    benches,
    bench_metrics_vector_20,
    bench_metrics_matrix_10,
    bench_metrics_matrix_20,
    bench_run_linear_100,
    bench_run_matrix_100,
);
criterion_main!(benches);
