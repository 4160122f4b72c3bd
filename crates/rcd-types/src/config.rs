// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{RcdError, RcdResult};
use crate::manifold::Shape;

/// State-update family used by a run.
///
/// Both families are legitimate operating modes of the same model:
/// - `LinearRelaxation`: H and M are vectors that relax toward each other,
///   R relaxes toward γ + ρ. This is the default interactive path.
/// - `MatrixCoupled`: H and M are square matrices coupled through
///   `M·Mᵗ·H` / `H·Hᵗ·M`, R is an AR(1) blend of γ and ρ clipped to [0, 2].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    #[default]
    LinearRelaxation,
    MatrixCoupled,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::LinearRelaxation => "linear_relaxation",
            UpdateMode::MatrixCoupled => "matrix_coupled",
        }
    }
}

impl std::str::FromStr for UpdateMode {
    type Err = RcdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" | "linear_relaxation" => Ok(UpdateMode::LinearRelaxation),
            "matrix" | "matrix_coupled" => Ok(UpdateMode::MatrixCoupled),
            other => Err(RcdError::Config(format!("unknown update mode '{other}'"))),
        }
    }
}

/// Parameters for one simulation run.
///
/// Immutable for the duration of a run: the engine copies it at
/// construction and reads it on every `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Reflection persistence weight (matrix-mode R update).
    /// Default: 0.7.
    pub alpha: f64,

    /// Phase-synchronisation weight in the R update.
    /// Default: 0.2.
    pub beta: f64,

    /// Semantic-correlation weight in the R update.
    /// Default: 0.1.
    pub delta: f64,

    /// Vector length (linear mode) or matrix side (matrix mode).
    /// Default: 3.
    pub n_dimensions: usize,

    /// Matrix-mode additive noise amplitude.
    /// Default: 0.1.
    pub noise_level: f64,

    /// Which update family drives H, M and R.
    pub mode: UpdateMode,

    /// Linear-mode relaxation rate of R toward γ + ρ.
    /// Default: 0.1.
    pub persistence: f64,

    /// Initial reflection value. `None` draws R uniformly from [0, 1).
    /// Default: `Some(0.1)`.
    pub initial_reflection: Option<f64>,

    /// Smooth γ and ρ through a rolling mean before recording them.
    pub smoothing: bool,

    /// Rolling-mean capacity.
    /// Default: 5.
    pub smoothing_window: usize,

    /// Per-timestep probability of a stochastic reactivation.
    /// Default: 0.1.
    pub reactivation_rate: f64,

    /// Uniform range of the reactivation boost.
    /// Default: (0.3, 0.7).
    pub reactivation_boost: (f64, f64),

    /// Seed for the run-scoped random source.
    /// Default: 42.
    pub seed: u64,

    /// Enforce the interactive slider ranges in `validate`.
    pub validate_ranges: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.7,
            beta: 0.2,
            delta: 0.1,
            n_dimensions: 3,
            noise_level: 0.1,
            mode: UpdateMode::LinearRelaxation,
            persistence: 0.1,
            initial_reflection: Some(0.1),
            smoothing: true,
            smoothing_window: 5,
            reactivation_rate: 0.1,
            reactivation_boost: (0.3, 0.7),
            seed: 42,
            validate_ranges: true,
        }
    }
}

fn check_unit(name: &str, value: f64) -> RcdResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RcdError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl SimulationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> RcdResult<()> {
        let scalars = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("delta", self.delta),
            ("noise_level", self.noise_level),
            ("persistence", self.persistence),
            ("reactivation_rate", self.reactivation_rate),
            ("reactivation_boost.0", self.reactivation_boost.0),
            ("reactivation_boost.1", self.reactivation_boost.1),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(RcdError::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if let Some(r0) = self.initial_reflection {
            if !r0.is_finite() {
                return Err(RcdError::Config(format!(
                    "initial_reflection must be finite, got {r0}"
                )));
            }
        }
        if self.n_dimensions < 1 {
            return Err(RcdError::Config(format!(
                "n_dimensions must be >= 1, got {}",
                self.n_dimensions
            )));
        }
        if self.smoothing_window < 1 {
            return Err(RcdError::Config(format!(
                "smoothing_window must be >= 1, got {}",
                self.smoothing_window
            )));
        }
        let (lo, hi) = self.reactivation_boost;
        if lo > hi {
            return Err(RcdError::Config(format!(
                "reactivation_boost lower bound {lo} exceeds upper bound {hi}"
            )));
        }

        if self.validate_ranges {
            check_unit("alpha", self.alpha)?;
            check_unit("beta", self.beta)?;
            check_unit("delta", self.delta)?;
            check_unit("persistence", self.persistence)?;
            check_unit("reactivation_rate", self.reactivation_rate)?;
            if self.n_dimensions > 20 {
                return Err(RcdError::Config(format!(
                    "n_dimensions must be in [1, 20], got {}",
                    self.n_dimensions
                )));
            }
            if !(0.0..=0.5).contains(&self.noise_level) {
                return Err(RcdError::Config(format!(
                    "noise_level must be in [0, 0.5], got {}",
                    self.noise_level
                )));
            }
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> RcdResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RcdError::Config(format!("JSON parse error: {e}")))
    }

    /// Number of scalar elements in each manifold for this config.
    pub fn manifold_len(&self) -> usize {
        match self.mode {
            UpdateMode::LinearRelaxation => self.n_dimensions,
            UpdateMode::MatrixCoupled => self.n_dimensions * self.n_dimensions,
        }
    }

    /// Manifold shape for this config: `n` vector or `n × n` matrix.
    pub fn shape(&self) -> Shape {
        match self.mode {
            UpdateMode::LinearRelaxation => Shape::Vector(self.n_dimensions),
            UpdateMode::MatrixCoupled => Shape::Matrix {
                rows: self.n_dimensions,
                cols: self.n_dimensions,
            },
        }
    }
}
