//! mdof - MDoF Vibration Simulator
//!
//! Simulates the free response of a linear multi-degree-of-freedom system.
//!
//! # Usage
//!
//! ```bash
//! mdof system.json --horizon 20 --stride 100 > response.csv
//! RUST_LOG=debug mdof --format json > response.json
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use mdof_core::{
    error::{MdofError, Result},
    output::{write_stdout, OutputFormat},
    solver::{ModalDampingFormula, Solver, SolverConfig, StiffnessScaling, DEFAULT_INTEGRATION_STEP},
    SystemDescription,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MDoF linear vibration simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the system description (.json); the default two-DOF system if omitted
    #[arg(value_name = "SYSTEM_FILE")]
    system_file: Option<PathBuf>,

    /// Simulation horizon in seconds (overrides the file)
    #[arg(short = 'T', long)]
    horizon: Option<f64>,

    /// Integration step in seconds
    #[arg(long, default_value_t = DEFAULT_INTEGRATION_STEP)]
    dt: f64,

    /// Emit every n-th integration step
    #[arg(short, long, default_value_t = 1)]
    stride: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Include velocity columns in CSV output
    #[arg(long)]
    velocity: bool,

    /// Keep the trailing samples after the system has come to rest
    #[arg(long)]
    no_trim: bool,

    /// Modal damping formula: source | rayleigh
    #[arg(long, default_value = "source")]
    damping: String,

    /// Stiffness scaling: source | mass-normalized
    #[arg(long, default_value = "source")]
    scaling: String,

    /// Integrate modes in parallel
    #[arg(long)]
    parallel: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_description(path: Option<&Path>) -> Result<SystemDescription> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| MdofError::FileReadError {
                path: path.display().to_string(),
                source,
            })?;
            SystemDescription::from_json(&text)
        }
        None => Ok(SystemDescription::default_two_dof()),
    }
}

fn build_config(args: &Args) -> Result<SolverConfig> {
    let damping: ModalDampingFormula = args.damping.parse()?;
    let scaling: StiffnessScaling = args.scaling.parse()?;

    Ok(SolverConfig::new()
        .with_dt(args.dt)
        .with_output_stride(args.stride)
        .with_trim(!args.no_trim)
        .with_damping_formula(damping)
        .with_stiffness_scaling(scaling)
        .with_parallel(args.parallel))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Load and validate the system
    let description = load_description(args.system_file.as_deref())?;
    let system = description.to_system()?;
    let horizon = args.horizon.unwrap_or_else(|| description.horizon());

    // Decompose
    let config = build_config(&args)?;
    let solver = Solver::with_config(system, config)?;
    info!(
        frequencies = ?solver.decomposition().natural_frequencies().as_slice(),
        "natural frequencies (rad/s)"
    );

    // Simulate and export
    let response = solver.solve(horizon)?;
    write_stdout(&response, args.format, args.velocity)?;

    Ok(())
}
