//! spinsep Command-Line Interface
//!
//! Generates synthetic Fermi-Hubbard datasets, inspects experiment files and
//! runs the rescaled spin-charge separation analysis.
//!
//! ```text
//! spinsep simulate --output data --u 0,4 --layouts 3
//! spinsep analyze --data data --output out -v
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{analyze, inspect, simulate, version};

/// spinsep - spin-charge separation analysis of Fermi-Hubbard experiments
#[derive(Parser)]
#[command(name = "spinsep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a synthetic dataset from the reference simulation
    Simulate {
        /// Output data directory
        #[arg(short, long)]
        output: String,

        /// Comma-separated interaction strengths, one group each
        #[arg(short, long, default_value = "0.0,4.0")]
        u: String,

        /// Qubit layouts (instances) per interaction strength
        #[arg(short, long, default_value = "3")]
        layouts: usize,

        /// Largest Trotter step; every step from 0 is sampled
        #[arg(long, default_value = "8")]
        steps: usize,

        /// Shots per Trotter step
        #[arg(long, default_value = "1000")]
        shots: u64,

        /// Depolarising probability per Trotter step
        #[arg(long, default_value = "0.02")]
        noise: f64,

        /// Readout bit-flip probability
        #[arg(long, default_value = "0.01")]
        readout_error: f64,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Sites per chain
        #[arg(long, default_value = "6")]
        sites: usize,

        /// Fermions per spin chain
        #[arg(long, default_value = "2")]
        particles: usize,

        /// Trotter time step
        #[arg(long, default_value = "0.3")]
        dt: f64,

        /// Parasitic controlled-phase angle of the hardware gates
        #[arg(long)]
        parasitic_cphase: Option<f64>,
    },

    /// Summarise an experiment file or data directory
    Inspect {
        /// Experiment JSON file or data directory
        #[arg(short, long)]
        input: String,
    },

    /// Bundle, rescale and report a data directory
    Analyze {
        /// Data directory (<root>/<u-label>/*.json)
        #[arg(short, long)]
        data: String,

        /// YAML analysis configuration
        #[arg(short, long)]
        config: Option<String>,

        /// Output directory for report.json and charts
        #[arg(short, long, default_value = "spinsep-out")]
        output: String,

        /// Quantities to report and plot (defaults to the configuration)
        #[arg(short, long = "quantity")]
        quantities: Vec<String>,

        /// Draw standard-error instead of standard-deviation bands
        #[arg(long)]
        std_error: bool,

        /// Keep each bundle's own rescaling fit
        #[arg(long)]
        no_shared_rescaling: bool,

        /// Skip chart rendering
        #[arg(long)]
        no_plots: bool,

        /// Write report.json without indentation
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Simulate {
            output,
            u,
            layouts,
            steps,
            shots,
            noise,
            readout_error,
            seed,
            sites,
            particles,
            dt,
            parasitic_cphase,
        } => simulate::execute(&simulate::SimulateArgs {
            output,
            u,
            layouts,
            steps,
            shots,
            noise,
            readout_error,
            seed,
            sites,
            particles,
            dt,
            parasitic_cphase,
        }),

        Commands::Inspect { input } => inspect::execute(&input),

        Commands::Analyze {
            data,
            config,
            output,
            quantities,
            std_error,
            no_shared_rescaling,
            no_plots,
            compact,
        } => analyze::execute(&analyze::AnalyzeArgs {
            data,
            config,
            output,
            quantities,
            std_error,
            shared_rescaling: !no_shared_rescaling,
            plots: !no_plots,
            pretty: !compact,
        }),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
