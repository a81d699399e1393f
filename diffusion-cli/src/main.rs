mod config;
mod ic;

use anyhow::Context;
use clap::Parser;
use config::{RunConfig, load_config};
use diffusion_core::params::default_worker_count;
use diffusion_core::{BackendKind, FinalBuffer, GridState, SimulationParams, run_with_state};
use ic::{IcType, generate_interior};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "diffusion", author, version, about)]
struct Args {
    /// TOML run configuration (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid length, both boundary points included
    #[arg(long)]
    intervals: Option<usize>,

    /// Number of time steps
    #[arg(long, allow_negative_numbers = true)]
    time_steps: Option<i64>,

    /// Diffusion coefficient k
    #[arg(long, allow_negative_numbers = true)]
    coefficient: Option<f64>,

    /// Worker count (default: available parallelism)
    #[arg(long, env = "DIFFUSION_NUM_THREADS", allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Parallel backend: rayon, threads or inline
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Fixed value at index 0
    #[arg(long, allow_negative_numbers = true)]
    boundary_low: Option<f64>,

    /// Fixed value at the last index
    #[arg(long, allow_negative_numbers = true)]
    boundary_high: Option<f64>,

    /// Initial interior
    #[arg(long, value_enum)]
    ic: Option<IcType>,

    /// RNG seed for noise/gaussian initial conditions
    #[arg(long)]
    seed: Option<u64>,

    /// First index printed in the report
    #[arg(long, default_value_t = 2)]
    report_start: usize,

    /// End (exclusive) of the printed index range
    #[arg(long, default_value_t = 30)]
    report_end: usize,

    /// Stride between printed indices
    #[arg(long, default_value_t = 2)]
    report_stride: usize,

    /// Directory for result.bin and meta.json
    #[arg(long)]
    out: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

const DEFAULT_SEED: u64 = 123;

/// Everything a run needs once flags, config file and defaults are merged.
#[derive(Debug)]
struct Resolved {
    params: SimulationParams,
    backend: BackendKind,
    ic: IcType,
    seed: u64,
}

#[derive(Serialize)]
struct RunMeta<'a> {
    params: &'a SimulationParams,
    backend: BackendKind,
    ic_type: &'static str,
    seed: u64,
    elapsed_s: f64,
    values: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    let cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };
    let resolved = resolve(&args, cfg)?;
    let params = &resolved.params;

    println!(
        "Number of intervals: {}. Number of time steps: {}",
        params.intervals, params.time_steps
    );

    let mut state = GridState::initialize(
        params.intervals,
        params.boundary_low,
        params.boundary_high,
    )?;
    if resolved.ic != IcType::Zero {
        let mut rng = ChaCha8Rng::seed_from_u64(resolved.seed);
        let interior = generate_interior(&mut rng, params.interior_len(), resolved.ic);
        state.set_interior(&interior)?;
    }

    let t0 = Instant::now();
    let result = run_with_state(params, state, resolved.backend).context("simulation failed")?;
    let elapsed = t0.elapsed().as_secs_f64();

    println!("\nThe kernel ran in {elapsed:.6} seconds");
    for (i, v) in report_rows(&result, args.report_start, args.report_end, args.report_stride) {
        println!("Interval {i}: {v:.6}");
    }

    if let Some(dir) = &args.out {
        write_outputs(dir, &result, &resolved, elapsed)?;
        info!(dir = %dir.display(), "wrote results");
    }

    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve(args: &Args, cfg: RunConfig) -> anyhow::Result<Resolved> {
    let defaults = SimulationParams::default();

    let intervals = args.intervals.or(cfg.intervals).unwrap_or(defaults.intervals);
    let time_steps = args
        .time_steps
        .or(cfg.time_steps)
        .unwrap_or(defaults.time_steps as i64);
    let coefficient = args.coefficient.or(cfg.coefficient).unwrap_or(defaults.coefficient);
    let workers = args
        .workers
        .or(cfg.workers)
        .unwrap_or(default_worker_count() as i64);
    let low = args.boundary_low.or(cfg.boundary_low).unwrap_or(defaults.boundary_low);
    let high = args.boundary_high.or(cfg.boundary_high).unwrap_or(defaults.boundary_high);

    let params = SimulationParams::new(intervals, time_steps, coefficient, workers)?
        .with_boundaries(low, high);
    params.validate()?;

    Ok(Resolved {
        params,
        backend: args.backend.or(cfg.backend).unwrap_or_default(),
        ic: args.ic.or(cfg.ic).unwrap_or_default(),
        seed: args.seed.or(cfg.seed).unwrap_or(DEFAULT_SEED),
    })
}

/// `(index, value)` pairs for the printed report, stopping at the grid end.
fn report_rows(
    result: &FinalBuffer,
    start: usize,
    end: usize,
    stride: usize,
) -> Vec<(usize, f64)> {
    (start..end)
        .step_by(stride.max(1))
        .map_while(|i| result.get(i).map(|v| (i, v)))
        .collect()
}

fn write_outputs(
    dir: &Path,
    result: &FinalBuffer,
    resolved: &Resolved,
    elapsed_s: f64,
) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut values = BufWriter::new(File::create(dir.join("result.bin"))?);
    write_f64_vec(&mut values, result.values())?;
    values.flush()?;

    let meta = RunMeta {
        params: result.params(),
        backend: result.backend(),
        ic_type: resolved.ic.as_str(),
        seed: resolved.seed,
        elapsed_s,
        values: result.len(),
    };
    let mut meta_file = BufWriter::new(File::create(dir.join("meta.json"))?);
    serde_json::to_writer_pretty(&mut meta_file, &meta)?;
    meta_file.write_all(b"\n")?;
    meta_file.flush()?;

    Ok(())
}

fn write_f64_vec<W: Write>(w: &mut W, v: &[f64]) -> std::io::Result<()> {
    for &x in v {
        w.write_all(&x.to_le_bytes())?;
    }
    Ok(())
}
