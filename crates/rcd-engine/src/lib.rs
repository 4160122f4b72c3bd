// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Simulation Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Simulation engine for Recursive Cognitive Dynamics.
//!
//! `SimulationEngine` owns one run's H/M/R state, smoothing buffers,
//! perturbation schedule and random source, and drives the timestep
//! loop. `Session` is the caller-owned holder for interactive use: the
//! last finished run plus a bounded log of symbolic inputs.
//!
//! # Run Invariants
//!
//! 1. **Reproducible**: one `ChaCha8Rng`, reseeded at every `initialize`,
//!    feeds every draw in a fixed order. Same seed, config and schedule
//!    give bit-identical output.
//!
//! 2. **Causal injection**: an event scheduled at timestep k is applied
//!    at the start of step k, so records at t < k never see it.
//!
//! 3. **No NaN in output**: every recorded metric passes through its
//!    fallback before storage; R is always finite, and stays in [0, 2]
//!    in matrix mode.

pub mod engine;
pub mod session;

pub use engine::{EngineState, SimulationEngine};
pub use session::{Fate, Session, SymbolEntry, SymbolMemory, SymbolicCore, SymbolicReading};
