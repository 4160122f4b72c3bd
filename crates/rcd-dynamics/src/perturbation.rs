// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Perturbation Scheduler
// ─────────────────────────────────────────────────────────────────────
//! Two independent mechanisms, applied in this order every timestep:
//!
//! 1. Scheduled injection: additive modulation of the *state* (H, M or R)
//!    at timesteps listed in an `InjectionSchedule`.
//! 2. Stochastic reactivation: with probability `rate`, a one-off boost
//!    of one *metric* (γ or ρ) for the current timestep, clipped at 1.0.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use rcd_types::{
    InjectionEvent, InjectionPayload, InjectionSchedule, InjectionTarget, ManifoldState, RcdError,
    RcdResult, SimulationConfig,
};

use crate::rng::{seeded, standard_normals, RunRng};

/// Metric boosted by a reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactivationTarget {
    PhaseSync,
    SemanticCorr,
}

/// Stochastic reactivation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reactivation {
    /// Per-timestep trigger probability.
    pub rate: f64,
    /// Inclusive uniform range of the boost.
    pub boost: (f64, f64),
}

impl Default for Reactivation {
    fn default() -> Self {
        Self {
            rate: 0.1,
            boost: (0.3, 0.7),
        }
    }
}

impl Reactivation {
    /// No reactivation ever fires.
    pub fn disabled() -> Self {
        Self {
            rate: 0.0,
            ..Self::default()
        }
    }

    /// Draw the trigger and, if it fires, boost γ or ρ (chosen uniformly).
    ///
    /// The trigger draw happens every call so the random stream does not
    /// depend on the rate.
    pub fn apply(
        &self,
        gamma: f64,
        rho: f64,
        rng: &mut RunRng,
    ) -> (f64, f64, Option<ReactivationTarget>) {
        let u: f64 = rng.gen();
        if u >= self.rate {
            return (gamma, rho, None);
        }
        let target = if rng.gen_bool(0.5) {
            ReactivationTarget::PhaseSync
        } else {
            ReactivationTarget::SemanticCorr
        };
        let (lo, hi) = self.boost;
        let boost = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
        match target {
            ReactivationTarget::PhaseSync => ((gamma + boost).min(1.0), rho, Some(target)),
            ReactivationTarget::SemanticCorr => (gamma, (rho + boost).min(1.0), Some(target)),
        }
    }
}

/// Scheduled injection + stochastic reactivation for one run.
#[derive(Debug, Clone, Default)]
pub struct PerturbationScheduler {
    schedule: InjectionSchedule,
    reactivation: Reactivation,
}

impl PerturbationScheduler {
    pub fn new(schedule: InjectionSchedule, reactivation: Reactivation) -> Self {
        Self {
            schedule,
            reactivation,
        }
    }

    pub fn from_config(config: &SimulationConfig, schedule: InjectionSchedule) -> Self {
        Self::new(
            schedule,
            Reactivation {
                rate: config.reactivation_rate,
                boost: config.reactivation_boost,
            },
        )
    }

    pub fn schedule(&self) -> &InjectionSchedule {
        &self.schedule
    }

    pub fn reactivation(&self) -> &Reactivation {
        &self.reactivation
    }

    /// Add one event, keeping the schedule ordered by timestep.
    pub fn add_event(&mut self, event: InjectionEvent) {
        self.schedule.push(event);
    }

    /// Apply every event scheduled at timestep `t` to `state`.
    ///
    /// Returns the number of events applied. Shape mismatches are fatal.
    pub fn inject(&self, t: usize, state: &mut ManifoldState, rng: &mut RunRng) -> RcdResult<usize> {
        let mut applied = 0;
        for event in self.schedule.events_at(t) {
            apply_event(event, state, rng)?;
            log::debug!("t={t}: injected into {}", event.target);
            applied += 1;
        }
        Ok(applied)
    }

    /// Stochastic reactivation of the current metrics.
    pub fn reactivate(
        &self,
        gamma: f64,
        rho: f64,
        rng: &mut RunRng,
    ) -> (f64, f64, Option<ReactivationTarget>) {
        self.reactivation.apply(gamma, rho, rng)
    }
}

fn apply_event(event: &InjectionEvent, state: &mut ManifoldState, rng: &mut RunRng) -> RcdResult<()> {
    event.validate(state.shape())?;
    match (&event.payload, event.target) {
        (InjectionPayload::Vector(v), InjectionTarget::H) => state.h.add_assign(event.target, v),
        (InjectionPayload::Vector(v), InjectionTarget::M) => state.m.add_assign(event.target, v),
        (InjectionPayload::Scalar(s), InjectionTarget::R) => {
            state.r += s;
            Ok(())
        }
        (InjectionPayload::Gaussian { mean, std }, InjectionTarget::R) => {
            let z: f64 = rng.sample(StandardNormal);
            state.r += mean + std * z;
            Ok(())
        }
        (InjectionPayload::Gaussian { mean, std }, target) => {
            let n = state.h.len();
            let delta: Vec<f64> = standard_normals(rng, n)
                .into_iter()
                .map(|z| mean + std * z)
                .collect();
            match target {
                InjectionTarget::H => state.h.add_assign(target, &delta),
                _ => state.m.add_assign(target, &delta),
            }
        }
        // `validate` rejects every other combination.
        (_, target) => Err(RcdError::ShapeMismatch {
            target,
            expected: "compatible payload".to_string(),
            got: format!("{:?}", event.payload),
        }),
    }
}

/// FNV-1a; stable across platforms and releases.
fn stable_hash(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |h, b| (h ^ b as u64).wrapping_mul(PRIME))
}

/// Deterministic injections derived from a symbolic concept.
///
/// H and M each receive an N(0, 0.1) vector seeded by the hash of
/// `"{symbol}_H"` / `"{symbol}_M"`; R receives `hash("{symbol}_R") % 100 / 100`.
pub fn symbolic_schedule(symbol: &str, n_elements: usize, timestep: usize) -> InjectionSchedule {
    let vector_for = |suffix: &str| -> Vec<f64> {
        let mut rng = seeded(stable_hash(&format!("{symbol}_{suffix}")));
        standard_normals(&mut rng, n_elements)
            .into_iter()
            .map(|z| 0.1 * z)
            .collect()
    };
    let r_boost = (stable_hash(&format!("{symbol}_R")) % 100) as f64 / 100.0;

    InjectionSchedule::new()
        .with_event(InjectionEvent::new(
            timestep,
            InjectionTarget::H,
            InjectionPayload::Vector(vector_for("H")),
        ))
        .with_event(InjectionEvent::new(
            timestep,
            InjectionTarget::M,
            InjectionPayload::Vector(vector_for("M")),
        ))
        .with_event(InjectionEvent::new(
            timestep,
            InjectionTarget::R,
            InjectionPayload::Scalar(r_boost),
        ))
}
