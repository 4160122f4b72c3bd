// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Canonical Update Constants
// ─────────────────────────────────────────────────────────────────────
//! Fixed coefficients of the two update families.
//!
//! Matrix-coupled:
//!   H' = DAMPING·H + COUPLING_WEIGHT·(COUPLING_SCALE·M·Mᵗ·H)
//!      + REFLECTION_WEIGHT·(R·H) + noise_level·ξ
//!
//! Linear-relaxation:
//!   H' = H + RELAXATION_RATE·(M − H) + LINEAR_NOISE_SCALE·R·ξ

pub const DAMPING: f64 = 0.95;
pub const COUPLING_WEIGHT: f64 = 0.1;
pub const COUPLING_SCALE: f64 = 0.3;
pub const REFLECTION_WEIGHT: f64 = 0.05;

pub const RELAXATION_RATE: f64 = 0.05;
pub const LINEAR_NOISE_SCALE: f64 = 0.01;

/// Matrix-mode clip bounds for R.
pub const REFLECTION_MIN: f64 = 0.0;
pub const REFLECTION_MAX: f64 = 2.0;

/// Matrix-mode saturation bound for every H/M element. The cubic
/// coupling term diverges within a few steps without it.
pub const MANIFOLD_LIMIT: f64 = 1e3;

/// R at `initialize` unless the config overrides it.
pub const DEFAULT_INITIAL_REFLECTION: f64 = 0.1;

/// Default rolling-mean capacity.
pub const DEFAULT_WINDOW: usize = 5;
