// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Simulation Engine
// ─────────────────────────────────────────────────────────────────────
//! Per-run state machine: `Uninitialized → Initialized → Running → Completed`.
//!
//! Each timestep t:
//!
//! 1. apply scheduled injections for t to H, M or R
//! 2. record H, M and the current R
//! 3. compute raw γ, ρ, d
//! 4. stochastic reactivation of γ or ρ
//! 5. rolling-mean smoothing of γ and ρ (if enabled)
//! 6. append the record to the time series
//! 7. advance H, M, R with the (smoothed) γ and ρ

use rand::Rng;
use serde::{Deserialize, Serialize};

use rcd_dynamics::rng::standard_normals;
use rcd_dynamics::{seeded, PerturbationScheduler, RollingSmoother, RunRng, StateUpdater};
use rcd_metrics::Metrics;
use rcd_types::{
    InjectionEvent, InjectionSchedule, Manifold, ManifoldState, RcdError, RcdResult,
    SimulationConfig, StepRecord, TimeSeries,
};

/// Lifecycle of a `SimulationEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Running,
    Completed,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initialized => "initialized",
            EngineState::Running => "running",
            EngineState::Completed => "completed",
        }
    }
}

/// One simulation run.
///
/// Owns its H/M/R state, smoothing buffers, schedule and random source
/// exclusively; two engines never share arrays.
pub struct SimulationEngine {
    config: SimulationConfig,
    scheduler: PerturbationScheduler,
    updater: StateUpdater,
    rng: RunRng,
    state: ManifoldState,
    gamma_smoother: RollingSmoother,
    rho_smoother: RollingSmoother,
    series: TimeSeries,
    timestep: usize,
    phase: EngineState,
    saturated: bool,
}

impl SimulationEngine {
    /// Build an engine. The config is validated here; the schedule is
    /// validated against the manifold shape at `initialize`.
    pub fn new(config: SimulationConfig, schedule: InjectionSchedule) -> RcdResult<Self> {
        config.validate()?;
        let shape = config.shape();
        Ok(Self {
            scheduler: PerturbationScheduler::from_config(&config, schedule),
            updater: StateUpdater::from_config(&config),
            rng: seeded(config.seed),
            state: ManifoldState {
                h: Manifold::zeros(shape),
                m: Manifold::zeros(shape),
                r: 0.0,
            },
            gamma_smoother: RollingSmoother::new(config.smoothing_window),
            rho_smoother: RollingSmoother::new(config.smoothing_window),
            series: TimeSeries::default(),
            timestep: 0,
            phase: EngineState::Uninitialized,
            saturated: false,
            config,
        })
    }

    /// Engine with the default config and no injections.
    pub fn with_defaults() -> RcdResult<Self> {
        Self::new(SimulationConfig::default(), InjectionSchedule::new())
    }

    /// Start a fresh run, discarding any previous state.
    ///
    /// Reseeds the random source, draws H and M from N(0, 1), sets R from
    /// `initial_reflection` (or a uniform [0, 1) draw) and clears the
    /// smoothing buffers and the output series.
    pub fn initialize(&mut self) -> RcdResult<()> {
        self.config.validate()?;
        let shape = self.config.shape();
        self.scheduler.schedule().validate(shape)?;

        self.rng = seeded(self.config.seed);
        let h = Manifold::from_shape(shape, standard_normals(&mut self.rng, shape.len()))?;
        let m = Manifold::from_shape(shape, standard_normals(&mut self.rng, shape.len()))?;
        let r = match self.config.initial_reflection {
            Some(r) => r,
            None => self.rng.gen::<f64>(),
        };
        self.state = ManifoldState::new(h, m, self.updater.bound_reflection(r))?;

        self.gamma_smoother = RollingSmoother::new(self.config.smoothing_window);
        self.rho_smoother = RollingSmoother::new(self.config.smoothing_window);
        self.series = TimeSeries::default();
        self.timestep = 0;
        self.phase = EngineState::Initialized;
        self.saturated = false;

        log::debug!(
            "initialize: mode={} shape={} seed={} R0={:.4} injections={}",
            self.config.mode.as_str(),
            shape.describe(),
            self.config.seed,
            self.state.r,
            self.scheduler.schedule().len()
        );
        Ok(())
    }

    /// Run one timestep and return what was recorded for it.
    pub fn step(&mut self) -> RcdResult<StepRecord> {
        self.ensure_steppable("step")?;
        let t = self.timestep;

        if self.scheduler.inject(t, &mut self.state, &mut self.rng)? > 0 {
            self.state.r = self.updater.bound_reflection(self.state.r);
        }

        let raw = Metrics::compute(&self.state.h, &self.state.m);
        let (gamma, rho, boosted) =
            self.scheduler
                .reactivate(raw.phase_sync, raw.semantic_corr, &mut self.rng);
        if let Some(target) = boosted {
            log::debug!("t={t}: reactivation boosted {target:?}");
        }
        let (gamma, rho) = if self.config.smoothing {
            (self.gamma_smoother.update(gamma), self.rho_smoother.update(rho))
        } else {
            (gamma, rho)
        };

        let record = StepRecord {
            timestep: t,
            h: self.state.h.clone(),
            m: self.state.m.clone(),
            phase_sync: gamma,
            semantic_corr: rho,
            procrustes_dist: raw.structural_dist,
            reflection: self.state.r,
            reactivated: boosted.is_some(),
        };
        self.series.push(record.clone());

        let saturated = self
            .updater
            .advance(&mut self.state, gamma, rho, &mut self.rng);
        if saturated && !self.saturated {
            log::warn!("t={t}: matrix-coupled H/M reached the saturation bound");
            self.saturated = true;
        }
        self.timestep += 1;
        self.phase = EngineState::Running;
        Ok(record)
    }

    /// Run `n_timesteps` further timesteps and complete the run.
    ///
    /// Returns the accumulated series: exactly `n_timesteps` long when
    /// called straight after `initialize`. `run(0)` yields empty sequences.
    pub fn run(&mut self, n_timesteps: usize) -> RcdResult<TimeSeries> {
        self.ensure_steppable("run")?;
        log::debug!("run: {n_timesteps} timesteps from t={}", self.timestep);
        for _ in 0..n_timesteps {
            self.step()?;
        }
        self.finish()
    }

    /// Complete a run started with `step` and yield its series.
    pub fn finish(&mut self) -> RcdResult<TimeSeries> {
        self.ensure_steppable("finish")?;
        self.phase = EngineState::Completed;
        log::info!(
            "run completed: {} timesteps, final R={:.4}",
            self.series.len(),
            self.state.r
        );
        Ok(self.series.clone())
    }

    /// Add an injection event to the schedule.
    ///
    /// Once the engine is initialized the event is checked against the
    /// manifold shape immediately. While running, events for timesteps
    /// that have already been stepped are rejected.
    pub fn add_injection(&mut self, event: InjectionEvent) -> RcdResult<()> {
        if self.phase != EngineState::Uninitialized {
            event.validate(self.state.shape())?;
        }
        if self.phase == EngineState::Running && event.timestep < self.timestep {
            return Err(RcdError::Config(format!(
                "injection at t={} is in the past; next timestep is {}",
                event.timestep, self.timestep
            )));
        }
        self.scheduler.add_event(event);
        Ok(())
    }

    fn ensure_steppable(&self, op: &str) -> RcdResult<()> {
        match self.phase {
            EngineState::Initialized | EngineState::Running => Ok(()),
            EngineState::Uninitialized => Err(RcdError::InvalidState(format!(
                "{op}: engine is uninitialized; call initialize first"
            ))),
            EngineState::Completed => Err(RcdError::InvalidState(format!(
                "{op}: run already completed; call initialize to start a new run"
            ))),
        }
    }

    pub fn state(&self) -> EngineState {
        self.phase
    }

    /// Current H, M and R (the state the next step starts from).
    pub fn manifold_state(&self) -> &ManifoldState {
        &self.state
    }

    /// Index of the next timestep to run.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn schedule(&self) -> &InjectionSchedule {
        self.scheduler.schedule()
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("phase", &self.phase)
            .field("timestep", &self.timestep)
            .field("mode", &self.config.mode)
            .field("r", &self.state.r)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rcd_dynamics::params::MANIFOLD_LIMIT;
    use rcd_types::{InjectionPayload, InjectionTarget, UpdateMode};

    use super::*;

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            reactivation_rate: 0.0,
            ..Default::default()
        }
    }

    fn engine(config: SimulationConfig) -> SimulationEngine {
        let mut e = SimulationEngine::new(config, InjectionSchedule::new()).unwrap();
        e.initialize().unwrap();
        e
    }

    #[test]
    fn test_new_is_uninitialized() {
        let e = SimulationEngine::with_defaults().unwrap();
        assert_eq!(e.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig {
            n_dimensions: 0,
            ..Default::default()
        };
        let err = SimulationEngine::new(config, InjectionSchedule::new()).unwrap_err();
        assert!(matches!(err, RcdError::Config(_)));
    }

    #[test]
    fn test_run_before_initialize_fails() {
        let mut e = SimulationEngine::with_defaults().unwrap();
        assert!(matches!(e.run(5), Err(RcdError::InvalidState(_))));
        assert!(matches!(e.step(), Err(RcdError::InvalidState(_))));
    }

    #[test]
    fn test_run_after_completion_requires_initialize() {
        let mut e = engine(quiet_config());
        e.run(3).unwrap();
        assert_eq!(e.state(), EngineState::Completed);
        assert!(matches!(e.run(1), Err(RcdError::InvalidState(_))));
        e.initialize().unwrap();
        assert_eq!(e.run(2).unwrap().len(), 2);
    }

    #[test]
    fn test_step_transitions_to_running() {
        let mut e = engine(quiet_config());
        assert_eq!(e.state(), EngineState::Initialized);
        let rec = e.step().unwrap();
        assert_eq!(rec.timestep, 0);
        assert_eq!(e.state(), EngineState::Running);
        assert_eq!(e.timestep(), 1);
    }

    #[test]
    fn test_step_then_run_accumulates() {
        let mut e = engine(quiet_config());
        e.step().unwrap();
        e.step().unwrap();
        let series = e.run(3).unwrap();
        assert_eq!(series.len(), 5);
    }

    #[test]
    fn test_finish_from_running() {
        let mut e = engine(quiet_config());
        e.step().unwrap();
        let series = e.finish().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(e.state(), EngineState::Completed);
    }

    #[test]
    fn test_initial_reflection_recorded_first() {
        let mut e = engine(quiet_config());
        let series = e.run(3).unwrap();
        assert_eq!(series.reflection[0], 0.1);
    }

    #[test]
    fn test_random_initial_reflection_in_unit_interval() {
        let mut e = engine(SimulationConfig {
            initial_reflection: None,
            ..quiet_config()
        });
        let r0 = e.manifold_state().r;
        assert!((0.0..1.0).contains(&r0), "R0={r0}");
        assert_eq!(e.run(1).unwrap().reflection[0], r0);
    }

    #[test]
    fn test_reinitialize_restarts_identically() {
        let mut e = engine(quiet_config());
        let first = e.run(20).unwrap();
        e.initialize().unwrap();
        let second = e.run(20).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_initialize_rejects_mismatched_schedule() {
        let schedule = InjectionSchedule::new().with_event(InjectionEvent::new(
            2,
            InjectionTarget::H,
            InjectionPayload::Vector(vec![0.1; 7]),
        ));
        let mut e = SimulationEngine::new(quiet_config(), schedule).unwrap();
        let err = e.initialize().unwrap_err();
        assert!(matches!(err, RcdError::ShapeMismatch { .. }));
        assert_eq!(e.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_add_injection_checked_after_initialize() {
        let mut e = engine(quiet_config());
        let bad = InjectionEvent::new(1, InjectionTarget::R, InjectionPayload::Vector(vec![1.0]));
        assert!(e.add_injection(bad).is_err());
        let good = InjectionEvent::new(1, InjectionTarget::R, InjectionPayload::Scalar(0.5));
        e.add_injection(good).unwrap();
        let injected = e.run(2).unwrap();
        let baseline = engine(quiet_config()).run(2).unwrap();
        let diff = injected.reflection[1] - baseline.reflection[1];
        assert!((diff - 0.5).abs() < 1e-12, "ΔR(1)={diff}");
    }

    #[test]
    fn test_matrix_mode_records_square_states() {
        let mut e = engine(SimulationConfig {
            mode: UpdateMode::MatrixCoupled,
            n_dimensions: 4,
            ..quiet_config()
        });
        let series = e.run(10).unwrap();
        assert!(series.h_states.iter().all(|h| h.dims() == (4, 4)));
        assert!(series.metrics_finite());
    }

    #[test]
    fn test_default_matrix_run_keeps_states_finite() {
        let mut e = engine(SimulationConfig {
            mode: UpdateMode::MatrixCoupled,
            ..Default::default()
        });
        let series = e.run(100).unwrap();
        assert_eq!(series.len(), 100);
        assert!(series.states_finite());
        assert!(series.metrics_finite());
        assert!(e.manifold_state().h.is_finite() && e.manifold_state().m.is_finite());
        for state in series.h_states.iter().chain(&series.m_states) {
            assert!(state.as_slice().iter().all(|v| v.abs() <= MANIFOLD_LIMIT));
        }
    }

    #[test]
    fn test_add_injection_in_the_past_rejected_while_running() {
        let mut e = engine(quiet_config());
        for _ in 0..3 {
            e.step().unwrap();
        }
        let late = InjectionEvent::new(1, InjectionTarget::R, InjectionPayload::Scalar(0.5));
        assert!(matches!(e.add_injection(late), Err(RcdError::Config(_))));
        assert_eq!(e.schedule().len(), 0);
        let current = InjectionEvent::new(3, InjectionTarget::R, InjectionPayload::Scalar(0.5));
        e.add_injection(current).unwrap();
        assert_eq!(e.step().unwrap().timestep, 3);
    }

    #[test]
    fn test_matrix_injection_on_reflection_is_clipped() {
        let mut e = SimulationEngine::new(
            SimulationConfig {
                mode: UpdateMode::MatrixCoupled,
                ..quiet_config()
            },
            InjectionSchedule::new().with_event(InjectionEvent::new(
                1,
                InjectionTarget::R,
                InjectionPayload::Scalar(5.0),
            )),
        )
        .unwrap();
        e.initialize().unwrap();
        let series = e.run(5).unwrap();
        assert_eq!(series.reflection[1], 2.0);
    }

    #[test]
    fn test_smoothing_disabled_records_raw_metrics() {
        let mut e = engine(SimulationConfig {
            smoothing: false,
            ..quiet_config()
        });
        let rec = e.step().unwrap();
        let raw = Metrics::compute(&rec.h, &rec.m);
        assert_eq!(rec.phase_sync, raw.phase_sync);
        assert_eq!(rec.semantic_corr, raw.semantic_corr);
    }
}
