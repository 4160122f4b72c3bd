// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — End-to-End Simulation Tests
// ─────────────────────────────────────────────────────────────────────

use rcd_dynamics::params::DEFAULT_INITIAL_REFLECTION;
use rcd_engine::{EngineState, SimulationEngine};
use rcd_metrics::{alignment_series, drift_series};
use rcd_types::{
    InjectionEvent, InjectionPayload, InjectionSchedule, InjectionTarget, RcdError,
    SimulationConfig, TimeSeries, UpdateMode,
};

fn reference_config() -> SimulationConfig {
    SimulationConfig {
        alpha: 0.7,
        beta: 0.2,
        delta: 0.1,
        n_dimensions: 3,
        noise_level: 0.1,
        seed: 42,
        reactivation_rate: 0.0,
        ..Default::default()
    }
}

fn run(config: SimulationConfig, schedule: InjectionSchedule, n: usize) -> TimeSeries {
    let mut engine = SimulationEngine::new(config, schedule).unwrap();
    engine.initialize().unwrap();
    engine.run(n).unwrap()
}

/// Recorded output of `reference_config()` for 100 timesteps.
const REFERENCE_SERIES: &str = include_str!("golden/reference_scenario.json");

// JSON float parsing is best-effort to the last ulp.
const GOLDEN_TOL: f64 = 1e-12;

fn assert_series_close(name: &str, got: &[f64], want: &[f64]) {
    assert_eq!(got.len(), want.len(), "{name}: length");
    for (t, (g, w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() <= GOLDEN_TOL, "{name}({t}): got {g}, golden {w}");
    }
}

// ── Reference scenario ──────────────────────────────────────────────

#[test]
fn reference_scenario_matches_golden_series() {
    let golden: TimeSeries = serde_json::from_str(REFERENCE_SERIES).unwrap();
    let s = run(reference_config(), InjectionSchedule::new(), 100);

    assert_eq!(golden.len(), 100);
    assert_series_close("phase_sync", &s.phase_sync, &golden.phase_sync);
    assert_series_close("semantic_corr", &s.semantic_corr, &golden.semantic_corr);
    assert_series_close("procrustes_dist", &s.procrustes_dist, &golden.procrustes_dist);
    assert_series_close("reflection", &s.reflection, &golden.reflection);
    for t in 0..100 {
        assert_eq!(s.h_states[t].shape(), golden.h_states[t].shape());
        assert_series_close(
            &format!("H_states[{t}]"),
            s.h_states[t].as_slice(),
            golden.h_states[t].as_slice(),
        );
        assert_series_close(
            &format!("M_states[{t}]"),
            s.m_states[t].as_slice(),
            golden.m_states[t].as_slice(),
        );
    }
}

#[test]
fn reference_scenario_spot_values() {
    let s = run(reference_config(), InjectionSchedule::new(), 100);
    let h0 = [0.47798123835102174, 1.3340706102318078, -0.21086668327103028];
    assert_series_close("H_states[0]", s.h_states[0].as_slice(), &h0);
    assert_series_close("phase_sync[0]", &s.phase_sync[..1], &[0.8453473669204901]);
    assert_series_close("semantic_corr[0]", &s.semantic_corr[..1], &[0.23116974324306327]);
    assert_series_close("procrustes_dist[0]", &s.procrustes_dist[..1], &[0.7627244961112898]);
    assert_series_close("reflection[1]", &s.reflection[1..2], &[0.19765171101635534]);
    assert_series_close("reflection[99]", &s.reflection[99..], &[1.0008358841550589]);
}

#[test]
fn reference_scenario_is_reproducible() {
    let a = run(reference_config(), InjectionSchedule::new(), 100);
    let b = run(reference_config(), InjectionSchedule::new(), 100);

    assert_eq!(a.to_json(), b.to_json(), "same seed must serialise identically");
    assert_eq!(a.h_states.len(), 100);
    assert_eq!(a.m_states.len(), 100);
    assert_eq!(a.phase_sync.len(), 100);
    assert_eq!(a.semantic_corr.len(), 100);
    assert_eq!(a.procrustes_dist.len(), 100);
    assert_eq!(a.reflection.len(), 100);
    assert_eq!(a.reflection[0], DEFAULT_INITIAL_REFLECTION);
    assert!(a.metrics_finite());
}

#[test]
fn matrix_default_run_serialises_without_nulls() {
    let config = SimulationConfig {
        mode: UpdateMode::MatrixCoupled,
        ..Default::default()
    };
    let s = run(config, InjectionSchedule::new(), 100);
    assert!(s.states_finite());
    let json = s.to_json();
    assert!(!json.contains("null"));
    let back: TimeSeries = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 100);
}

#[test]
fn reference_scenario_metric_ranges() {
    let s = run(reference_config(), InjectionSchedule::new(), 100);
    for t in 0..s.len() {
        assert!((0.0..=1.0).contains(&s.phase_sync[t]), "γ({t})={}", s.phase_sync[t]);
        assert!((-1.0..=1.0).contains(&s.semantic_corr[t]), "ρ({t})={}", s.semantic_corr[t]);
        assert!((0.0..=1.0).contains(&s.procrustes_dist[t]), "d({t})={}", s.procrustes_dist[t]);
    }
}

#[test]
fn different_seeds_diverge() {
    let a = run(reference_config(), InjectionSchedule::new(), 10);
    let b = run(
        SimulationConfig {
            seed: 43,
            ..reference_config()
        },
        InjectionSchedule::new(),
        10,
    );
    assert_ne!(a.h_states[0], b.h_states[0]);
}

#[test]
fn reactivation_runs_are_reproducible() {
    let config = SimulationConfig {
        reactivation_rate: 0.5,
        ..reference_config()
    };
    let a = run(config.clone(), InjectionSchedule::new(), 60);
    let b = run(config, InjectionSchedule::new(), 60);
    assert_eq!(a, b);
}

#[test]
fn matrix_mode_is_reproducible() {
    let config = SimulationConfig {
        mode: UpdateMode::MatrixCoupled,
        ..reference_config()
    };
    let a = run(config.clone(), InjectionSchedule::attractor_pulse(10), 50);
    let b = run(config, InjectionSchedule::attractor_pulse(10), 50);
    assert_eq!(a.to_json(), b.to_json());
}

// ── Injection timing ────────────────────────────────────────────────

#[test]
fn injection_never_affects_earlier_timesteps() {
    let k = 20;
    let schedule = InjectionSchedule::new()
        .with_event(InjectionEvent::new(
            k,
            InjectionTarget::H,
            InjectionPayload::Vector(vec![1.0, -1.0, 0.5]),
        ))
        .with_event(InjectionEvent::new(
            k,
            InjectionTarget::R,
            InjectionPayload::Scalar(0.3),
        ));
    let baseline = run(reference_config(), InjectionSchedule::new(), 40);
    let injected = run(reference_config(), schedule, 40);

    for t in 0..k {
        assert_eq!(baseline.h_states[t], injected.h_states[t], "H differs at t={t}");
        assert_eq!(baseline.m_states[t], injected.m_states[t], "M differs at t={t}");
        assert_eq!(baseline.reflection[t], injected.reflection[t], "R differs at t={t}");
        assert_eq!(baseline.phase_sync[t], injected.phase_sync[t], "γ differs at t={t}");
    }
    assert_ne!(baseline.h_states[k], injected.h_states[k]);
    let dr = injected.reflection[k] - baseline.reflection[k];
    assert!((dr - 0.3).abs() < 1e-12, "ΔR(k)={dr}");
}

#[test]
fn injection_past_end_is_ignored() {
    let schedule = InjectionSchedule::new().with_event(InjectionEvent::new(
        500,
        InjectionTarget::M,
        InjectionPayload::Vector(vec![9.0; 3]),
    ));
    let baseline = run(reference_config(), InjectionSchedule::new(), 30);
    let injected = run(reference_config(), schedule, 30);
    assert_eq!(baseline, injected);
}

#[test]
fn mismatched_injection_fails_fast() {
    let schedule = InjectionSchedule::new().with_event(InjectionEvent::new(
        50,
        InjectionTarget::H,
        InjectionPayload::Vector(vec![0.1; 4]),
    ));
    let mut engine = SimulationEngine::new(reference_config(), schedule).unwrap();
    let err = engine.initialize().unwrap_err();
    assert!(matches!(err, RcdError::ShapeMismatch { target: InjectionTarget::H, .. }));
}

// ── Boundaries & lifecycle ──────────────────────────────────────────

#[test]
fn run_zero_returns_empty_series() {
    let mut engine = SimulationEngine::new(reference_config(), InjectionSchedule::new()).unwrap();
    engine.initialize().unwrap();
    let s = engine.run(0).unwrap();
    assert!(s.is_empty());
    assert!(s.h_states.is_empty() && s.m_states.is_empty());
    assert!(s.phase_sync.is_empty() && s.semantic_corr.is_empty());
    assert!(s.procrustes_dist.is_empty() && s.reflection.is_empty());
    assert_eq!(engine.state(), EngineState::Completed);
}

#[test]
fn lifecycle_errors_are_invalid_state() {
    let mut engine = SimulationEngine::new(reference_config(), InjectionSchedule::new()).unwrap();
    assert!(matches!(engine.run(1), Err(RcdError::InvalidState(_))));
    engine.initialize().unwrap();
    engine.run(1).unwrap();
    assert!(matches!(engine.step(), Err(RcdError::InvalidState(_))));
    assert!(matches!(engine.finish(), Err(RcdError::InvalidState(_))));
}

#[test]
fn stepwise_equals_batch() {
    let batch = run(reference_config(), InjectionSchedule::new(), 25);

    let mut engine = SimulationEngine::new(reference_config(), InjectionSchedule::new()).unwrap();
    engine.initialize().unwrap();
    for t in 0..25 {
        let rec = engine.step().unwrap();
        assert_eq!(rec.timestep, t);
        assert_eq!(rec.reflection, batch.reflection[t]);
    }
    assert_eq!(engine.finish().unwrap(), batch);
}

// ── Reflection bounds ───────────────────────────────────────────────

#[test]
fn matrix_reflection_stays_in_bounds() {
    for seed in [1, 7, 42, 1234] {
        let config = SimulationConfig {
            mode: UpdateMode::MatrixCoupled,
            n_dimensions: 5,
            noise_level: 0.5,
            alpha: 1.0,
            beta: 1.0,
            delta: 1.0,
            reactivation_rate: 0.3,
            initial_reflection: Some(1.9),
            seed,
            ..Default::default()
        };
        let schedule = InjectionSchedule::new()
            .with_event(InjectionEvent::new(
                3,
                InjectionTarget::R,
                InjectionPayload::Scalar(10.0),
            ))
            .with_event(InjectionEvent::new(
                8,
                InjectionTarget::R,
                InjectionPayload::Scalar(-10.0),
            ));
        let s = run(config, schedule, 200);
        assert!(s.metrics_finite(), "seed={seed}");
        assert!(s.states_finite(), "seed={seed}");
        for (t, r) in s.reflection.iter().enumerate() {
            assert!((0.0..=2.0).contains(r), "seed={seed} R({t})={r}");
        }
    }
}

// ── Derived metrics ─────────────────────────────────────────────────

#[test]
fn alignment_and_drift_cover_every_timestep() {
    let s = run(reference_config(), InjectionSchedule::new(), 40);
    let alpha = alignment_series(&s);
    let drift = drift_series(&s);
    assert_eq!(alpha.len(), 40);
    assert_eq!(drift.len(), 40);
    assert_eq!(drift[0], 0.0);
    assert!(drift.iter().all(|d| d.is_finite() && *d >= 0.0));
}
