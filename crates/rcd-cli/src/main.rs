// ─────────────────────────────────────────────────────────────────────
// Attractor Forge — rcd-sim Command Line
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! rcd-sim - batch runner for the RCD simulation kernel
//!
//! Usage:
//!   rcd-sim run                               # 100 steps, default parameters
//!   rcd-sim run --mode matrix -n 4 --json     # matrix-coupled run, JSON output
//!   rcd-sim run --inject 20:H:0.1,0.1,0.1     # scheduled injection at t=20
//!   rcd-sim run --symbol self-worth           # symbol-derived injection at t=0
//!   rcd-sim config > base.json                # dump the default config
//!
//! Library log output goes to stderr; filter it with `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use rcd_dynamics::symbolic_schedule;
use rcd_engine::{SimulationEngine, SymbolicReading};
use rcd_metrics::{alignment_series, drift_series};
use rcd_types::{
    InjectionEvent, InjectionPayload, InjectionSchedule, InjectionTarget, SimulationConfig,
    TimeSeries, UpdateMode,
};

#[derive(Parser)]
#[command(name = "rcd-sim")]
#[command(about = "Recursive Cognitive Dynamics simulation runner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its metric trajectories
    Run(RunArgs),

    /// Print the default configuration as JSON
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// Base configuration file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of timesteps
    #[arg(short = 't', long, default_value_t = 100)]
    steps: usize,

    /// Reflection persistence weight α
    #[arg(long)]
    alpha: Option<f64>,

    /// Phase-sync weight β
    #[arg(long)]
    beta: Option<f64>,

    /// Semantic-correlation weight δ
    #[arg(long)]
    delta: Option<f64>,

    /// Manifold size (vector length or matrix side)
    #[arg(short = 'n', long = "dimensions")]
    n_dimensions: Option<usize>,

    /// Matrix-mode noise amplitude
    #[arg(long = "noise")]
    noise_level: Option<f64>,

    /// Update family: linear | matrix
    #[arg(long)]
    mode: Option<UpdateMode>,

    /// Linear-mode R relaxation rate
    #[arg(long)]
    persistence: Option<f64>,

    /// Initial reflection value R(0)
    #[arg(long, conflicts_with = "random_reflection")]
    initial_reflection: Option<f64>,

    /// Draw R(0) uniformly from [0, 1)
    #[arg(long)]
    random_reflection: bool,

    /// Record raw γ/ρ instead of the rolling mean
    #[arg(long)]
    no_smoothing: bool,

    /// Rolling-mean window
    #[arg(long = "window")]
    smoothing_window: Option<usize>,

    /// Per-step reactivation probability
    #[arg(long)]
    reactivation_rate: Option<f64>,

    /// Reactivation boost range, e.g. 0.5,1.0
    #[arg(long, value_parser = parse_range)]
    boost: Option<(f64, f64)>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the interactive parameter range checks
    #[arg(long)]
    no_range_checks: bool,

    /// Scheduled injection `t:TARGET:v1,v2,...` (repeatable)
    #[arg(long = "inject", value_parser = parse_injection)]
    injections: Vec<InjectionEvent>,

    /// Attractor pulse (H +N(0.1,0.05), M +N(-0.1,0.05), R +0.2) at this step
    #[arg(long)]
    pulse: Option<usize>,

    /// Symbolic concept whose derived payloads are injected at t=0
    #[arg(long)]
    symbol: Option<String>,

    /// Emit JSON instead of one text line per timestep
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn build_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SimulationConfig::from_json(&raw)?
            }
            None => SimulationConfig::default(),
        };
        if let Some(v) = self.alpha {
            config.alpha = v;
        }
        if let Some(v) = self.beta {
            config.beta = v;
        }
        if let Some(v) = self.delta {
            config.delta = v;
        }
        if let Some(v) = self.n_dimensions {
            config.n_dimensions = v;
        }
        if let Some(v) = self.noise_level {
            config.noise_level = v;
        }
        if let Some(v) = self.mode {
            config.mode = v;
        }
        if let Some(v) = self.persistence {
            config.persistence = v;
        }
        if let Some(v) = self.initial_reflection {
            config.initial_reflection = Some(v);
        }
        if self.random_reflection {
            config.initial_reflection = None;
        }
        if self.no_smoothing {
            config.smoothing = false;
        }
        if let Some(v) = self.smoothing_window {
            config.smoothing_window = v;
        }
        if let Some(v) = self.reactivation_rate {
            config.reactivation_rate = v;
        }
        if let Some(v) = self.boost {
            config.reactivation_boost = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if self.no_range_checks {
            config.validate_ranges = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn build_schedule(&self, config: &SimulationConfig) -> InjectionSchedule {
        let mut schedule = InjectionSchedule::new();
        for event in &self.injections {
            schedule.push(event.clone());
        }
        if let Some(t) = self.pulse {
            schedule.extend(InjectionSchedule::attractor_pulse(t));
        }
        if let Some(symbol) = self.symbol.as_deref().filter(|s| !s.trim().is_empty()) {
            schedule.extend(symbolic_schedule(symbol, config.manifold_len(), 0));
        }
        schedule
    }
}

fn parse_range(raw: &str) -> Result<(f64, f64), String> {
    let (lo, hi) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LO,HI, got '{raw}'"))?;
    let lo: f64 = lo.trim().parse().map_err(|e| format!("bad lower bound: {e}"))?;
    let hi: f64 = hi.trim().parse().map_err(|e| format!("bad upper bound: {e}"))?;
    Ok((lo, hi))
}

/// `t:TARGET:v1,v2,...`. R takes exactly one value; H and M take a vector.
fn parse_injection(raw: &str) -> Result<InjectionEvent, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(t), Some(target), Some(values)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected t:TARGET:v1,v2,..., got '{raw}'"));
    };
    let timestep: usize = t.trim().parse().map_err(|e| format!("bad timestep '{t}': {e}"))?;
    let target: InjectionTarget = target.trim().parse().map_err(|e| format!("{e}"))?;
    let values = values
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad payload value: {e}"))?;
    let payload = match (target, values.as_slice()) {
        (InjectionTarget::R, [v]) => InjectionPayload::Scalar(*v),
        (InjectionTarget::R, _) => return Err("R injection takes exactly one value".to_string()),
        (_, _) => InjectionPayload::Vector(values),
    };
    Ok(InjectionEvent::new(timestep, target, payload))
}

fn print_text(series: &TimeSeries) {
    for t in 0..series.len() {
        println!(
            "t={t:03} | γ(t): {:.3} | ρ(t): {:.3} | R(t): {:.3} | Λ(t): {:.3}",
            series.phase_sync[t],
            series.semantic_corr[t],
            series.reflection[t],
            1.0 - series.procrustes_dist[t],
        );
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.build_config()?;
    let schedule = args.build_schedule(&config);

    let mut engine = SimulationEngine::new(config.clone(), schedule)?;
    engine.initialize()?;
    let series = engine.run(args.steps)?;
    if !series.metrics_finite() || !series.states_finite() {
        bail!("simulation produced non-finite values");
    }

    let reading = args
        .symbol
        .as_ref()
        .map(|_| SymbolicReading::compute(config.alpha, config.beta, config.delta));

    if args.json {
        let report = json!({
            "config": config,
            "series": series,
            "alignment": alignment_series(&series),
            "drift": drift_series(&series),
            "symbolic": reading,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_text(&series);
    if let (Some(symbol), Some(r)) = (&args.symbol, reading) {
        println!(
            "symbol '{symbol}': γ={:.4} τ={:.4} drift={:.4} fate={}",
            r.gamma,
            r.tau,
            r.drift,
            r.fate.as_str().to_uppercase()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&SimulationConfig::default())?);
            Ok(())
        }
    }
}
