// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — Interactive Session State
// ─────────────────────────────────────────────────────────────────────
//! Caller-owned state carried across interactive runs: a bounded log of
//! symbolic inputs, the symbolic drift summary, and the last finished run.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use rcd_dynamics::symbolic_schedule;
use rcd_types::{InjectionSchedule, RcdResult, SimulationConfig, TimeSeries};

use crate::engine::SimulationEngine;

/// Default `SymbolMemory` capacity.
pub const DEFAULT_MEMORY_CAPACITY: usize = 5;

/// Default `SymbolicCore` history bound.
pub const DEFAULT_CORE_HISTORY: usize = 100;

/// One symbolic input: the concept plus the parameters it was run with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub alpha: f64,
    pub beta: f64,
    pub delta: f64,
}

impl SymbolEntry {
    pub fn new(symbol: impl Into<String>, alpha: f64, beta: f64, delta: f64) -> Self {
        Self {
            symbol: symbol.into(),
            alpha,
            beta,
            delta,
        }
    }

    pub fn from_config(symbol: impl Into<String>, config: &SimulationConfig) -> Self {
        Self::new(symbol, config.alpha, config.beta, config.delta)
    }
}

/// Bounded FIFO of recent symbolic inputs, oldest evicted first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMemory {
    entries: VecDeque<SymbolEntry>,
    capacity: usize,
}

impl SymbolMemory {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, entry: SymbolEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn get_recent(&self) -> Vec<SymbolEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SymbolMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CAPACITY)
    }
}

/// Outcome class of a symbolic drift reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fate {
    /// drift < 0.2
    Recover,
    /// 0.2 ≤ drift < 0.6
    Rebase,
    /// drift ≥ 0.6
    Collapse,
}

impl Fate {
    pub fn from_drift(drift: f64) -> Self {
        if drift < 0.2 {
            Fate::Recover
        } else if drift < 0.6 {
            Fate::Rebase
        } else {
            Fate::Collapse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fate::Recover => "recover",
            Fate::Rebase => "rebase",
            Fate::Collapse => "collapse",
        }
    }
}

/// Symbolic drift summary for one input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolicReading {
    /// γ = 1 / (1 + θ·entropy)
    pub gamma: f64,
    /// μ·(1 − γ)
    pub drift: f64,
    /// τ = γ·(μ + entropy)
    pub tau: f64,
    pub fate: Fate,
}

impl SymbolicReading {
    /// θ = alpha, μ = beta, entropy = delta.
    pub fn compute(theta: f64, mu: f64, entropy: f64) -> Self {
        let gamma = 1.0 / (1.0 + theta * entropy);
        let drift = mu * (1.0 - gamma);
        Self {
            gamma,
            drift,
            tau: gamma * (mu + entropy),
            fate: Fate::from_drift(drift),
        }
    }
}

/// Scalar drift model over the stream of symbolic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolicCore {
    history: VecDeque<SymbolEntry>,
    capacity: usize,
    last: Option<SymbolicReading>,
}

impl SymbolicCore {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::new(),
            capacity: capacity.max(1),
            last: None,
        }
    }

    /// Record `entry` and compute its reading.
    pub fn update(&mut self, entry: &SymbolEntry) -> SymbolicReading {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(entry.clone());
        let reading = SymbolicReading::compute(entry.alpha, entry.beta, entry.delta);
        self.last = Some(reading);
        reading
    }

    pub fn last(&self) -> Option<SymbolicReading> {
        self.last
    }

    pub fn history(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for SymbolicCore {
    fn default() -> Self {
        Self::new(DEFAULT_CORE_HISTORY)
    }
}

/// State an interactive host keeps between runs.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub memory: SymbolMemory,
    pub core: SymbolicCore,
    last_run: Option<TimeSeries>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `symbol`, inject its derived payloads at t = 0 and run a fresh
    /// engine for `n_timesteps`. A blank symbol runs without injections.
    pub fn run(
        &mut self,
        symbol: &str,
        config: &SimulationConfig,
        n_timesteps: usize,
    ) -> RcdResult<&TimeSeries> {
        let schedule = if symbol.trim().is_empty() {
            InjectionSchedule::new()
        } else {
            symbolic_schedule(symbol, config.manifold_len(), 0)
        };
        let mut engine = SimulationEngine::new(config.clone(), schedule)?;
        engine.initialize()?;
        let series = engine.run(n_timesteps)?;

        let entry = SymbolEntry::from_config(symbol, config);
        let reading = self.core.update(&entry);
        self.memory.add(entry);
        log::debug!(
            "session: '{symbol}' → drift={:.4} fate={}",
            reading.drift,
            reading.fate.as_str()
        );
        Ok(&*self.last_run.insert(series))
    }

    pub fn last_run(&self) -> Option<&TimeSeries> {
        self.last_run.as_ref()
    }
}
