// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Dynamics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! RCD dynamics: per-timestep state update (linear-relaxation and
//! matrix-coupled families), rolling γ/ρ smoothing, and the two
//! perturbation mechanisms (scheduled injection, stochastic reactivation).

pub mod params;
pub mod perturbation;
pub mod rng;
pub mod smoother;
pub mod updater;

pub use perturbation::{symbolic_schedule, PerturbationScheduler, Reactivation, ReactivationTarget};
pub use rng::{seeded, RunRng};
pub use smoother::RollingSmoother;
pub use updater::StateUpdater;
