// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Aggregate Alignment & Lake State
// ─────────────────────────────────────────────────────────────────────
//! Derived trajectory metrics built on γ, ρ, d and R:
//!
//!   α(t) = (γ + ρ) / (1 + d)          aggregate alignment
//!   δ(t) = |α(t) − α(t−1)|            drift
//!   Λ(t) = w_γ·γ + w_ρ·ρ + w_R·R      Lake-state activation

use serde::{Deserialize, Serialize};

use rcd_types::TimeSeries;

/// Aggregate alignment α = (γ + ρ) / (1 + d).
pub fn alignment(gamma: f64, rho: f64, d: f64) -> f64 {
    let a = (gamma + rho) / (1.0 + d);
    if a.is_finite() {
        a
    } else {
        0.0
    }
}

/// Drift δ = |α_curr − α_prev|.
pub fn drift(prev_alignment: f64, curr_alignment: f64) -> f64 {
    (curr_alignment - prev_alignment).abs()
}

/// α(t) for every timestep of a finished run.
pub fn alignment_series(series: &TimeSeries) -> Vec<f64> {
    series
        .phase_sync
        .iter()
        .zip(&series.semantic_corr)
        .zip(&series.procrustes_dist)
        .map(|((&g, &r), &d)| alignment(g, r, d))
        .collect()
}

/// δ(t) for every timestep; δ(0) = 0.
pub fn drift_series(series: &TimeSeries) -> Vec<f64> {
    let alpha = alignment_series(series);
    let mut out = Vec::with_capacity(alpha.len());
    let mut prev = None;
    for a in alpha {
        out.push(prev.map_or(0.0, |p| drift(p, a)));
        prev = Some(a);
    }
    out
}

/// Λ(t) weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeWeights {
    pub gamma: f64,
    pub rho: f64,
    pub reflection: f64,
}

impl Default for LakeWeights {
    fn default() -> Self {
        Self {
            gamma: 0.4,
            rho: 0.4,
            reflection: 0.2,
        }
    }
}

/// Lake-state activation Λ = w_γ·γ + w_ρ·ρ + w_R·R.
pub fn lake_state(gamma: f64, rho: f64, r: f64, w: &LakeWeights) -> f64 {
    w.gamma * gamma + w.rho * rho + w.reflection * r
}

/// Entry thresholds for the Lake state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeThresholds {
    pub phase_sync: f64,
    pub drift: f64,
    pub attention: f64,
    pub recursion_depth: u32,
}

impl Default for LakeThresholds {
    fn default() -> Self {
        Self {
            phase_sync: 0.92,
            drift: 0.08,
            attention: 0.85,
            recursion_depth: 5,
        }
    }
}

/// True if every Lake-state entry condition holds.
pub fn lake_state_conditions(
    phase_sync: f64,
    drift: f64,
    attention: f64,
    recursion_depth: u32,
    t: &LakeThresholds,
) -> bool {
    phase_sync >= t.phase_sync
        && drift <= t.drift
        && attention >= t.attention
        && recursion_depth >= t.recursion_depth
}

/// Unreinforced decay: max(0, Λ − rate).
pub fn lake_decay(lambda: f64, rate: f64) -> f64 {
    (lambda - rate).max(0.0)
}

/// Reinforcement: min(1, Λ + gain).
pub fn lake_reinforce(lambda: f64, gain: f64) -> f64 {
    (lambda + gain).min(1.0)
}

/// Timesteps where γ > threshold and d < 1 − threshold.
pub fn detect_coherence(series: &TimeSeries, threshold: f64) -> Vec<usize> {
    series
        .phase_sync
        .iter()
        .zip(&series.procrustes_dist)
        .enumerate()
        .filter(|(_, (&g, &d))| g > threshold && d < 1.0 - threshold)
        .map(|(t, _)| t)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(gamma: &[f64], rho: &[f64], d: &[f64]) -> TimeSeries {
        TimeSeries {
            phase_sync: gamma.to_vec(),
            semantic_corr: rho.to_vec(),
            procrustes_dist: d.to_vec(),
            reflection: vec![0.1; gamma.len()],
            ..Default::default()
        }
    }

    #[test]
    fn test_alignment_formula() {
        assert!((alignment(0.6, 0.4, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_degenerate_denominator() {
        assert_eq!(alignment(0.5, 0.5, -1.0), 0.0);
    }

    #[test]
    fn test_drift_series_starts_at_zero() {
        let s = series(&[0.5, 0.7, 0.7], &[0.5, 0.5, 0.1], &[0.0, 0.0, 0.0]);
        let d = drift_series(&s);
        assert_eq!(d.len(), 3);
        assert_eq!(d[0], 0.0);
        assert!((d[1] - 0.2).abs() < 1e-12);
        assert!((d[2] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_lake_state_default_weights() {
        let l = lake_state(1.0, 0.5, 2.0, &LakeWeights::default());
        assert!((l - (0.4 + 0.2 + 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_lake_conditions() {
        let t = LakeThresholds::default();
        assert!(lake_state_conditions(0.95, 0.05, 0.9, 5, &t));
        assert!(!lake_state_conditions(0.95, 0.05, 0.9, 4, &t));
        assert!(!lake_state_conditions(0.90, 0.05, 0.9, 5, &t));
    }

    #[test]
    fn test_lake_decay_and_reinforce_bounded() {
        assert_eq!(lake_decay(0.005, 0.01), 0.0);
        assert!((lake_decay(0.5, 0.01) - 0.49).abs() < 1e-12);
        assert_eq!(lake_reinforce(0.98, 0.05), 1.0);
    }

    #[test]
    fn test_detect_coherence() {
        let s = series(&[0.99, 0.96, 0.5], &[0.0; 3], &[0.01, 0.2, 0.0]);
        assert_eq!(detect_coherence(&s, 0.95), vec![0]);
    }
}
