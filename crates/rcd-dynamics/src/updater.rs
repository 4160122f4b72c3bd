// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — State Updater
// ─────────────────────────────────────────────────────────────────────
//! One-timestep advance of (H, M, R).
//!
//! Linear-relaxation (vector manifolds):
//!
//!   H' = H + 0.05·(M − H) + 0.01·R·ξ_H
//!   M' = M + 0.05·(H' − M) + 0.01·R·ξ_M
//!   R' = R + p·(γ + ρ − R)
//!
//! Matrix-coupled (square manifolds):
//!
//!   H' = 0.95·H + 0.1·(0.3·M·Mᵗ·H) + 0.05·R·H + σ·ξ_H
//!   M' = 0.95·M + 0.1·(0.3·H'·H'ᵗ·M) + 0.05·R·M + σ·ξ_M
//!   R' = clip(α·R + β·γ + δ·ρ, 0, 2)
//!
//! M is updated against the already-advanced H'. Noise ξ is elementwise
//! N(0, 1) from the run's random source, drawn H first, then M.
//!
//! Matrix-coupled elements saturate at ±`MANIFOLD_LIMIT` (NaN maps to the
//! lower bound), so recorded states are always finite.

use rcd_metrics::linalg::{gram, matmul};
use rcd_types::{clamp_finite, finite_or, Manifold, ManifoldState, SimulationConfig, UpdateMode};

use crate::params::{
    COUPLING_SCALE, COUPLING_WEIGHT, DAMPING, LINEAR_NOISE_SCALE, MANIFOLD_LIMIT, REFLECTION_MAX,
    REFLECTION_MIN, REFLECTION_WEIGHT, RELAXATION_RATE,
};
use crate::rng::{standard_normals, RunRng};

/// Advances H, M and R according to the configured update family.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdater {
    pub mode: UpdateMode,
    pub alpha: f64,
    pub beta: f64,
    pub delta: f64,
    pub noise_level: f64,
    pub persistence: f64,
}

impl StateUpdater {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            mode: config.mode,
            alpha: config.alpha,
            beta: config.beta,
            delta: config.delta,
            noise_level: config.noise_level,
            persistence: config.persistence,
        }
    }

    /// Advance the whole state by one timestep using this step's γ and ρ.
    ///
    /// Returns true if any H/M element hit the saturation bound.
    pub fn advance(&self, state: &mut ManifoldState, gamma: f64, rho: f64, rng: &mut RunRng) -> bool {
        let r = state.r;
        state.h = self.update_manifold(&state.h, &state.m, r, rng);
        state.m = self.update_manifold(&state.m, &state.h, r, rng);
        state.r = self.update_reflection(r, gamma, rho);
        self.mode == UpdateMode::MatrixCoupled && (is_saturated(&state.h) || is_saturated(&state.m))
    }

    /// New value of `x` coupled to `other` (H against M, or M against H').
    pub fn update_manifold(&self, x: &Manifold, other: &Manifold, r: f64, rng: &mut RunRng) -> Manifold {
        let noise = standard_normals(rng, x.len());
        let data = match self.mode {
            UpdateMode::LinearRelaxation => x
                .as_slice()
                .iter()
                .zip(other.as_slice())
                .zip(&noise)
                .map(|((&xi, &oi), &z)| xi + RELAXATION_RATE * (oi - xi) + r * z * LINEAR_NOISE_SCALE)
                .collect(),
            UpdateMode::MatrixCoupled => {
                let (n, cols) = x.dims();
                // other·otherᵗ·x, n×n · n×cols
                let coupling = matmul(&gram(other.as_slice(), n, cols), x.as_slice(), n, n, cols);
                x.as_slice()
                    .iter()
                    .zip(&coupling)
                    .zip(&noise)
                    .map(|((&xi, &ci), &z)| {
                        let next = DAMPING * xi
                            + COUPLING_WEIGHT * (COUPLING_SCALE * ci)
                            + REFLECTION_WEIGHT * (r * xi)
                            + self.noise_level * z;
                        clamp_finite(next, -MANIFOLD_LIMIT, MANIFOLD_LIMIT)
                    })
                    .collect()
            }
        };
        // Shape is carried over unchanged from `x`.
        match Manifold::from_shape(x.shape(), data) {
            Ok(next) => next,
            Err(_) => x.clone(),
        }
    }

    /// Bring an externally set R (initial value, injection) back into
    /// the mode's admissible range.
    pub fn bound_reflection(&self, r: f64) -> f64 {
        match self.mode {
            UpdateMode::LinearRelaxation => finite_or(r, 0.0),
            UpdateMode::MatrixCoupled => clamp_finite(r, REFLECTION_MIN, REFLECTION_MAX),
        }
    }

    /// New reflection value; always finite.
    pub fn update_reflection(&self, r: f64, gamma: f64, rho: f64) -> f64 {
        match self.mode {
            UpdateMode::LinearRelaxation => {
                finite_or(r + self.persistence * (gamma + rho - r), finite_or(r, 0.0))
            }
            UpdateMode::MatrixCoupled => clamp_finite(
                self.alpha * r + self.beta * gamma + self.delta * rho,
                REFLECTION_MIN,
                REFLECTION_MAX,
            ),
        }
    }
}

fn is_saturated(x: &Manifold) -> bool {
    x.as_slice().iter().any(|v| v.abs() >= MANIFOLD_LIMIT)
}
