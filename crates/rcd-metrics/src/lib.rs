// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Alignment Metrics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Alignment metrics between the two RCD manifolds H and M.
//!
//! - `metrics`: γ (phase synchronisation), ρ (semantic correlation),
//!   d (Procrustes / normalised Euclidean distance)
//! - `alignment`: aggregate alignment α, drift δ, Lake state Λ
//! - `linalg`: row-major helpers and a Jacobi eigensolver

pub mod alignment;
pub mod linalg;
pub mod metrics;

pub use alignment::{
    alignment, alignment_series, detect_coherence, drift, drift_series, lake_state,
    LakeThresholds, LakeWeights,
};
pub use metrics::{
    normalised_euclidean, phase_synchronization, semantic_correlation, structural_distance,
    Metrics, DISTANCE_EPS,
};
