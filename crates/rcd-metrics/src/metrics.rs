// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Alignment Metrics
// ─────────────────────────────────────────────────────────────────────
//! Phase synchronisation γ, semantic correlation ρ and structural
//! (Procrustes) distance d between two same-shaped manifolds.
//!
//! All three are pure and never return NaN/Inf: degenerate inputs map
//! to a fixed fallback value.
//!
//! | metric                 | degenerate input             | fallback               |
//! |------------------------|------------------------------|------------------------|
//! | `phase_synchronization`| zero norm / non-finite       | 0.0                    |
//! | (matrix inputs)        | eigen-decomposition failure  | max(0, corr(H, M))     |
//! | `semantic_correlation` | zero variance / non-finite   | 0.0                    |
//! | `structural_distance`  | Procrustes failure           | ‖H−M‖ / (‖H‖+‖M‖+ε)    |

use serde::{Deserialize, Serialize};

use rcd_types::Manifold;

use crate::linalg::{gram, singular_values, symmetric_eigenvalues};

/// Denominator guard for the normalised Euclidean fallback.
pub const DISTANCE_EPS: f64 = 1e-8;

/// The three per-timestep alignment metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// γ(t)
    pub phase_sync: f64,
    /// ρ(t)
    pub semantic_corr: f64,
    /// d(t)
    pub structural_dist: f64,
}

impl Metrics {
    pub fn compute(h: &Manifold, m: &Manifold) -> Self {
        Self {
            phase_sync: phase_synchronization(h, m),
            semantic_corr: semantic_correlation(h, m),
            structural_dist: structural_distance(h, m),
        }
    }
}

/// Phase synchronisation γ between H and M.
///
/// Vectors: `1 − |cos(H, M)|`, in [0, 1].
/// Matrices: `|mean(exp(i·(φ_H − φ_M)))|` over the phases of the
/// ascending eigenvalues of H·Hᵗ and M·Mᵗ, falling back to the
/// flattened correlation (clipped at 0) if the decomposition fails.
pub fn phase_synchronization(h: &Manifold, m: &Manifold) -> f64 {
    if h.len() != m.len() || h.is_empty() {
        return 0.0;
    }
    if h.is_matrix() && m.is_matrix() {
        match eigen_phase_alignment(h, m) {
            Some(gamma) => gamma,
            None => {
                log::debug!("phase_synchronization: eigen path failed, using correlation");
                pearson(h.as_slice(), m.as_slice())
                    .map(|c| c.max(0.0))
                    .unwrap_or(0.0)
            }
        }
    } else {
        cosine_phase(h.as_slice(), m.as_slice())
    }
}

/// Pearson correlation ρ of the flattened arrays, in [−1, 1].
///
/// Exactly 0.0 if either side has zero variance or the result is not finite.
pub fn semantic_correlation(h: &Manifold, m: &Manifold) -> f64 {
    if h.len() != m.len() {
        return 0.0;
    }
    pearson(h.as_slice(), m.as_slice()).unwrap_or(0.0)
}

/// Structural distance d between H and M.
///
/// Procrustes disparity for matrices with at least two rows; the
/// normalised Euclidean distance otherwise or whenever the alignment
/// is degenerate. Both lie in [0, 1]; fully non-finite input yields 1.0.
pub fn structural_distance(h: &Manifold, m: &Manifold) -> f64 {
    if h.shape() == m.shape() && h.is_matrix() {
        if let Some(d) = procrustes_disparity(h, m) {
            return d;
        }
        log::debug!("structural_distance: Procrustes degenerate, using normalised Euclidean");
    }
    normalised_euclidean(h.as_slice(), m.as_slice())
}

/// ‖H − M‖ / (‖H‖ + ‖M‖ + ε).
pub fn normalised_euclidean(h: &[f64], m: &[f64]) -> f64 {
    if h.len() != m.len() {
        return 1.0;
    }
    let diff = h
        .iter()
        .zip(m)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt();
    let nh = h.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nm = m.iter().map(|v| v * v).sum::<f64>().sqrt();
    let d = diff / (nh + nm + DISTANCE_EPS);
    if d.is_finite() {
        d
    } else {
        1.0
    }
}

fn cosine_phase(h: &[f64], m: &[f64]) -> f64 {
    let nh = h.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nm = m.iter().map(|v| v * v).sum::<f64>().sqrt();
    if nh == 0.0 || nm == 0.0 {
        return 0.0;
    }
    let dot: f64 = h.iter().zip(m).map(|(a, b)| a * b).sum();
    let gamma = 1.0 - (dot / (nh * nm)).abs();
    if gamma.is_finite() {
        gamma.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn eigen_phase_alignment(h: &Manifold, m: &Manifold) -> Option<f64> {
    let (rows, cols) = h.dims();
    let eig_h = symmetric_eigenvalues(&gram(h.as_slice(), rows, cols), rows)?;
    let eig_m = symmetric_eigenvalues(&gram(m.as_slice(), rows, cols), rows)?;

    // Gram matrices are PSD: negative eigenvalues are round-off.
    let phase = |l: f64| 0.0f64.atan2(l.max(0.0));
    let n = rows as f64;
    let (sum_cos, sum_sin) = eig_h
        .iter()
        .zip(&eig_m)
        .map(|(&a, &b)| phase(a) - phase(b))
        .fold((0.0, 0.0), |(c, s), d: f64| (c + d.cos(), s + d.sin()));
    let gamma = ((sum_cos / n).powi(2) + (sum_sin / n).powi(2)).sqrt();
    gamma.is_finite().then(|| gamma.clamp(0.0, 1.0))
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    if is_constant(x) || is_constant(y) {
        return None;
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(x: &[f64]) -> bool {
    x.iter().all(|&v| v == x[0])
}

/// Procrustes disparity after centring and unit-Frobenius scaling.
///
/// With both inputs standardised, the optimal rotation + scale leaves a
/// residual of `1 − (Σσ)²`, σ the singular values of Hcᵗ·Mc.
fn procrustes_disparity(h: &Manifold, m: &Manifold) -> Option<f64> {
    let (rows, cols) = h.dims();
    if rows < 2 || cols == 0 {
        return None;
    }
    let a = standardise(h.as_slice(), rows, cols)?;
    let b = standardise(m.as_slice(), rows, cols)?;

    // C = Aᵗ · B (cols × cols)
    let mut c = vec![0.0; cols * cols];
    for i in 0..cols {
        for j in 0..cols {
            let mut dot = 0.0;
            for r in 0..rows {
                dot += a[r * cols + i] * b[r * cols + j];
            }
            c[i * cols + j] = dot;
        }
    }
    let nuclear: f64 = singular_values(&c, cols, cols)?.iter().sum();
    let disparity = 1.0 - nuclear * nuclear;
    disparity.is_finite().then(|| disparity.clamp(0.0, 1.0))
}

/// Subtract column means and scale to unit Frobenius norm.
fn standardise(x: &[f64], rows: usize, cols: usize) -> Option<Vec<f64>> {
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut out = x.to_vec();
    for j in 0..cols {
        let mean = (0..rows).map(|i| x[i * cols + j]).sum::<f64>() / rows as f64;
        for i in 0..rows {
            out[i * cols + j] -= mean;
        }
    }
    let norm = out.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    out.iter_mut().for_each(|v| *v /= norm);
    Some(out)
}
