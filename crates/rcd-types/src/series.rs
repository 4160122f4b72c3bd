// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Time Series Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::manifold::Manifold;

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_finite: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_finite: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Return `value` if finite, otherwise `fallback`.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("finite_or: non-finite value {value}, substituting {fallback:.4}");
        fallback
    }
}

/// Everything recorded for a single timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub timestep: usize,
    pub h: Manifold,
    pub m: Manifold,
    pub phase_sync: f64,
    pub semantic_corr: f64,
    pub procrustes_dist: f64,
    /// R at the start of the timestep (before the update).
    pub reflection: f64,
    /// True if a stochastic reactivation boosted γ or ρ this timestep.
    pub reactivated: bool,
}

/// Output of one run: six parallel, append-only sequences indexed by timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "H_states")]
    pub h_states: Vec<Manifold>,
    #[serde(rename = "M_states")]
    pub m_states: Vec<Manifold>,
    pub phase_sync: Vec<f64>,
    pub semantic_corr: Vec<f64>,
    pub procrustes_dist: Vec<f64>,
    pub reflection: Vec<f64>,
}

impl TimeSeries {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            h_states: Vec::with_capacity(n),
            m_states: Vec::with_capacity(n),
            phase_sync: Vec::with_capacity(n),
            semantic_corr: Vec::with_capacity(n),
            procrustes_dist: Vec::with_capacity(n),
            reflection: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, record: StepRecord) {
        self.h_states.push(record.h);
        self.m_states.push(record.m);
        self.phase_sync.push(record.phase_sync);
        self.semantic_corr.push(record.semantic_corr);
        self.procrustes_dist.push(record.procrustes_dist);
        self.reflection.push(record.reflection);
    }

    pub fn len(&self) -> usize {
        self.reflection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflection.is_empty()
    }

    /// True if all scalar sequences are free of NaN/Inf.
    pub fn metrics_finite(&self) -> bool {
        self.phase_sync
            .iter()
            .chain(&self.semantic_corr)
            .chain(&self.procrustes_dist)
            .chain(&self.reflection)
            .all(|v| v.is_finite())
    }

    /// True if every recorded H/M element is finite.
    pub fn states_finite(&self) -> bool {
        self.h_states
            .iter()
            .chain(&self.m_states)
            .all(Manifold::is_finite)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
