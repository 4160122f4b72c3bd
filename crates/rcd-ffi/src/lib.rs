// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — RCD Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the RCD simulation kernel.
//!
//! Exposes `SimulationConfig`, `SimulationEngine`, `SymbolMemory` and the
//! three alignment metrics to the interactive UI via PyO3. Run results
//! come back as dicts of lists keyed like the `TimeSeries` JSON.
//!
//! # FFI Safety
//!
//! - Config validated before storage (`SimulationConfig::validate()`).
//! - Configuration and shape errors raise `ValueError`; lifecycle errors
//!   (`run` before `initialize`, `run` after completion) raise `RuntimeError`.
//! - Manifolds cross the boundary as flat row-major lists plus a `shape`.
//!
//! Install: `pip install -e crates/rcd-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from rcd_kernel import SimulationConfig, SimulationEngine
//!
//! engine = SimulationEngine(SimulationConfig(alpha=0.7, seed=42))
//! engine.initialize()
//! results = engine.run(100)
//! results["phase_sync"][:5]
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use rcd_engine::{SimulationEngine, SymbolEntry, SymbolMemory};
use rcd_types::{
    InjectionEvent, InjectionPayload, InjectionSchedule, InjectionTarget, Manifold, RcdError,
    Shape, SimulationConfig, StepRecord, TimeSeries, UpdateMode,
};

fn to_py_err(e: RcdError) -> PyErr {
    match e {
        RcdError::InvalidState(_) => PyRuntimeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn shape_list(shape: Shape) -> Vec<usize> {
    match shape {
        Shape::Vector(n) => vec![n],
        Shape::Matrix { rows, cols } => vec![rows, cols],
    }
}

/// Accept either a flat list (vector) or a list of equal-length rows (matrix).
fn manifold_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Manifold> {
    if let Ok(flat) = obj.extract::<Vec<f64>>() {
        return Ok(Manifold::vector(flat));
    }
    let rows: Vec<Vec<f64>> = obj.extract()?;
    let cols = rows.first().map_or(0, |r| r.len());
    if rows.iter().any(|r| r.len() != cols) {
        return Err(PyValueError::new_err("matrix rows must have equal length"));
    }
    let shape = Shape::Matrix {
        rows: rows.len(),
        cols,
    };
    Manifold::from_shape(shape, rows.concat()).map_err(to_py_err)
}

fn series_to_dict<'py>(py: Python<'py>, series: &TimeSeries) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    let h: Vec<Vec<f64>> = series.h_states.iter().map(|h| h.as_slice().to_vec()).collect();
    let m: Vec<Vec<f64>> = series.m_states.iter().map(|m| m.as_slice().to_vec()).collect();
    dict.set_item("H_states", h)?;
    dict.set_item("M_states", m)?;
    dict.set_item("phase_sync", series.phase_sync.clone())?;
    dict.set_item("semantic_corr", series.semantic_corr.clone())?;
    dict.set_item("procrustes_dist", series.procrustes_dist.clone())?;
    dict.set_item("reflection", series.reflection.clone())?;
    if let Some(first) = series.h_states.first() {
        dict.set_item("shape", shape_list(first.shape()))?;
    }
    Ok(dict)
}

fn record_to_dict<'py>(py: Python<'py>, rec: &StepRecord) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("timestep", rec.timestep)?;
    dict.set_item("H", rec.h.as_slice().to_vec())?;
    dict.set_item("M", rec.m.as_slice().to_vec())?;
    dict.set_item("shape", shape_list(rec.h.shape()))?;
    dict.set_item("phase_sync", rec.phase_sync)?;
    dict.set_item("semantic_corr", rec.semantic_corr)?;
    dict.set_item("procrustes_dist", rec.procrustes_dist)?;
    dict.set_item("reflection", rec.reflection)?;
    dict.set_item("reactivated", rec.reactivated)?;
    Ok(dict)
}

// ─── PySimulationConfig ─────────────────────────────────────────────

/// Python-visible simulation parameters.
#[pyclass(name = "SimulationConfig")]
#[derive(Clone)]
struct PySimulationConfig {
    inner: SimulationConfig,
}

#[pymethods]
impl PySimulationConfig {
    #[new]
    #[pyo3(signature = (
        alpha = 0.7,
        beta = 0.2,
        delta = 0.1,
        n_dimensions = 3,
        noise_level = 0.1,
        mode = "linear",
        persistence = 0.1,
        initial_reflection = Some(0.1),
        smoothing = true,
        smoothing_window = 5,
        reactivation_rate = 0.1,
        reactivation_boost = (0.3, 0.7),
        seed = 42,
        validate_ranges = true,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        alpha: f64,
        beta: f64,
        delta: f64,
        n_dimensions: usize,
        noise_level: f64,
        mode: &str,
        persistence: f64,
        initial_reflection: Option<f64>,
        smoothing: bool,
        smoothing_window: usize,
        reactivation_rate: f64,
        reactivation_boost: (f64, f64),
        seed: u64,
        validate_ranges: bool,
    ) -> PyResult<Self> {
        let mode: UpdateMode = mode.parse().map_err(to_py_err)?;
        let config = SimulationConfig {
            alpha,
            beta,
            delta,
            n_dimensions,
            noise_level,
            mode,
            persistence,
            initial_reflection,
            smoothing,
            smoothing_window,
            reactivation_rate,
            reactivation_boost,
            seed,
            validate_ranges,
        };
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = SimulationConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    #[getter]
    fn mode(&self) -> &'static str {
        self.inner.mode.as_str()
    }

    #[getter]
    fn n_dimensions(&self) -> usize {
        self.inner.n_dimensions
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.inner.seed
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(alpha={}, beta={}, delta={}, n_dimensions={}, noise_level={}, mode={}, seed={})",
            self.inner.alpha,
            self.inner.beta,
            self.inner.delta,
            self.inner.n_dimensions,
            self.inner.noise_level,
            self.inner.mode.as_str(),
            self.inner.seed
        )
    }
}

// ─── PySimulationEngine ─────────────────────────────────────────────

/// One simulation run, driven from Python.
#[pyclass(name = "SimulationEngine")]
struct PySimulationEngine {
    inner: SimulationEngine,
}

#[pymethods]
impl PySimulationEngine {
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<PySimulationConfig>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = SimulationEngine::new(cfg, InjectionSchedule::new()).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Start a fresh run (reseeds, redraws H/M, resets R and buffers).
    fn initialize(&mut self) -> PyResult<()> {
        self.inner.initialize().map_err(to_py_err)
    }

    /// Run `n_timesteps` and return the whole series as a dict of lists.
    fn run<'py>(&mut self, py: Python<'py>, n_timesteps: usize) -> PyResult<Bound<'py, PyDict>> {
        let series = self.inner.run(n_timesteps).map_err(to_py_err)?;
        series_to_dict(py, &series)
    }

    /// Run one timestep and return its record.
    fn step<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let rec = self.inner.step().map_err(to_py_err)?;
        record_to_dict(py, &rec)
    }

    /// Complete a stepwise run and return its series.
    fn finish<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let series = self.inner.finish().map_err(to_py_err)?;
        series_to_dict(py, &series)
    }

    /// Schedule an additive injection.
    ///
    /// Args:
    ///     timestep: Step at which the payload is added.
    ///     target: "H", "M" or "R".
    ///     vector: Payload for H/M (flat, row-major for matrices).
    ///     value: Payload for R.
    #[pyo3(signature = (timestep, target, vector = None, value = None))]
    fn add_injection(
        &mut self,
        timestep: usize,
        target: &str,
        vector: Option<Vec<f64>>,
        value: Option<f64>,
    ) -> PyResult<()> {
        let target: InjectionTarget = target.parse().map_err(to_py_err)?;
        let payload = match (vector, value) {
            (Some(v), None) => InjectionPayload::Vector(v),
            (None, Some(s)) => InjectionPayload::Scalar(s),
            _ => {
                return Err(PyValueError::new_err(
                    "exactly one of `vector` or `value` is required",
                ))
            }
        };
        self.inner
            .add_injection(InjectionEvent::new(timestep, target, payload))
            .map_err(to_py_err)
    }

    /// Schedule the standard attractor pulse at `timestep`.
    fn add_attractor_pulse(&mut self, timestep: usize) -> PyResult<()> {
        for event in InjectionSchedule::attractor_pulse(timestep).events() {
            self.inner.add_injection(event.clone()).map_err(to_py_err)?;
        }
        Ok(())
    }

    /// Lifecycle state: "uninitialized", "initialized", "running" or "completed".
    #[getter]
    fn state(&self) -> &'static str {
        self.inner.state().as_str()
    }

    #[getter]
    fn timestep(&self) -> usize {
        self.inner.timestep()
    }

    /// Current reflection value R.
    #[getter]
    fn reflection(&self) -> f64 {
        self.inner.manifold_state().r
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationEngine(state={}, timestep={}, mode={})",
            self.inner.state().as_str(),
            self.inner.timestep(),
            self.inner.config().mode.as_str()
        )
    }
}

// ─── PySymbolMemory ─────────────────────────────────────────────────

/// Bounded FIFO log of symbolic inputs.
#[pyclass(name = "SymbolMemory")]
struct PySymbolMemory {
    inner: SymbolMemory,
}

#[pymethods]
impl PySymbolMemory {
    #[new]
    #[pyo3(signature = (capacity = 5))]
    fn new(capacity: usize) -> Self {
        Self {
            inner: SymbolMemory::new(capacity),
        }
    }

    fn add(&mut self, symbol: String, alpha: f64, beta: f64, delta: f64) {
        self.inner.add(SymbolEntry::new(symbol, alpha, beta, delta));
    }

    /// Entries oldest first, as dicts.
    fn get_recent<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let list = PyList::empty(py);
        for entry in self.inner.get_recent() {
            let dict = PyDict::new(py);
            dict.set_item("symbol", entry.symbol)?;
            dict.set_item("alpha", entry.alpha)?;
            dict.set_item("beta", entry.beta)?;
            dict.set_item("delta", entry.delta)?;
            list.append(dict)?;
        }
        Ok(list)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }
}

// ─── Metric functions ───────────────────────────────────────────────

/// γ between two same-shaped arrays.
#[pyfunction]
fn phase_synchronization(h: &Bound<'_, PyAny>, m: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(rcd_metrics::phase_synchronization(
        &manifold_from_py(h)?,
        &manifold_from_py(m)?,
    ))
}

/// Pearson ρ of the flattened arrays (0.0 on zero variance).
#[pyfunction]
fn semantic_correlation(h: &Bound<'_, PyAny>, m: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(rcd_metrics::semantic_correlation(
        &manifold_from_py(h)?,
        &manifold_from_py(m)?,
    ))
}

/// Procrustes disparity (matrices) or normalised Euclidean distance.
#[pyfunction]
fn structural_distance(h: &Bound<'_, PyAny>, m: &Bound<'_, PyAny>) -> PyResult<f64> {
    Ok(rcd_metrics::structural_distance(
        &manifold_from_py(h)?,
        &manifold_from_py(m)?,
    ))
}

// ─── Module Registration ────────────────────────────────────────────

/// RCD Kernel — Rust core of the Attractor Forge simulation.
///
/// - `SimulationConfig` — parameters
/// - `SimulationEngine` — initialize / run / step / add_injection
/// - `SymbolMemory` — recent symbolic inputs
/// - `phase_synchronization`, `semantic_correlation`, `structural_distance`
#[pymodule]
fn rcd_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulationConfig>()?;
    m.add_class::<PySimulationEngine>()?;
    m.add_class::<PySymbolMemory>()?;
    m.add_function(wrap_pyfunction!(phase_synchronization, m)?)?;
    m.add_function(wrap_pyfunction!(semantic_correlation, m)?)?;
    m.add_function(wrap_pyfunction!(structural_distance, m)?)?;
    Ok(())
}
