// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Recursive Cognitive Dynamics (RCD) simulation kernel.
//!
//! Everything here is plain data: manifolds, injection schedules,
//! simulation parameters and the per-run time series. The numerical
//! work lives in `rcd-metrics`, `rcd-dynamics` and `rcd-engine`.

pub mod config;
pub mod error;
pub mod injection;
pub mod manifold;
pub mod series;

pub use config::{SimulationConfig, UpdateMode};
pub use error::{RcdError, RcdResult};
pub use injection::{InjectionEvent, InjectionPayload, InjectionSchedule, InjectionTarget};
pub use manifold::{Manifold, ManifoldState, Shape};
pub use series::{clamp_finite, finite_or, StepRecord, TimeSeries};
