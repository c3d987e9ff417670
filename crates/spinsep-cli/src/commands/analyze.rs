//! Analyze command implementation.
//!
//! `spinsep analyze --data <dir> [--config <yaml>] [--output <dir>] [--quantity <name>...] [--compact]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use spinsep_analysis::export::{self, ExportConfig};
use spinsep_analysis::{
    AnalysisConfig, AnalysisProgress, Analyzer, ErrorBand, InstanceBundle, NumericsCache,
};
use spinsep_data::load_dataset;
use spinsep_plot::{PlotOptions, plot_quantity};
use spinsep_sim::Progress;

use super::common::{bar_style, parse_quantities};

/// One progress bar per reference simulation.
struct ReferenceBars {
    style: ProgressStyle,
    bar: Option<ProgressBar>,
}

impl AnalysisProgress for ReferenceBars {
    fn bundle_started(&mut self, bundle: &InstanceBundle) {
        let bar = ProgressBar::new(bundle.steps().len() as u64)
            .with_style(self.style.clone())
            .with_message(bundle.name().to_string());
        self.bar = Some(bar);
    }

    fn step_completed(&mut self, progress: Progress) {
        if let Some(bar) = &self.bar {
            bar.set_position(progress.completed as u64);
        }
    }

    fn bundle_finished(&mut self, _bundle: &InstanceBundle) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Arguments of the analyze command.
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub data: String,
    pub config: Option<String>,
    pub output: String,
    pub quantities: Vec<String>,
    pub std_error: bool,
    pub shared_rescaling: bool,
    pub plots: bool,
    pub pretty: bool,
}

/// Load the configuration file, if any, and apply command-line overrides.
pub fn resolve_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to load config: {path}"))?,
        None => AnalysisConfig::default(),
    };
    if !args.quantities.is_empty() {
        config.quantities = parse_quantities(&args.quantities)?;
    }
    if args.std_error {
        config.error_band = ErrorBand::StdError;
    }
    if !args.shared_rescaling {
        config.shared_rescaling = false;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the analyze command.
pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let cli_args: Vec<String> = std::env::args().collect();
    let data_root = Path::new(&args.data);
    let output = PathBuf::from(&args.output);

    println!(
        "{} Analysing {} ({} quantities)",
        style("→").cyan().bold(),
        style(data_root.display()).green(),
        config.quantities.len()
    );

    let dataset = load_dataset(data_root)
        .with_context(|| format!("Failed to load dataset: {}", data_root.display()))?;
    let analyzer = Analyzer::new(config.clone());
    let mut cache = NumericsCache::new();
    let mut bars = ReferenceBars {
        style: bar_style()?,
        bar: None,
    };
    let (bundles, report) = analyzer
        .analyze(dataset, &mut cache, &cli_args, Some(&mut bars))
        .context("Analysis failed")?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    let report_path = output.join("report.json");
    let export_config = ExportConfig {
        pretty: args.pretty,
    };
    export::to_file(&report, &report_path, &export_config)?;
    eprintln!(
        "{} Report written to {}",
        style("OK").green().bold(),
        report_path.display()
    );

    if args.plots {
        let options = PlotOptions {
            error_band: config.error_band,
            ..Default::default()
        };
        for &quantity in &config.quantities {
            let path = output.join(format!("{quantity}.svg"));
            plot_quantity(&bundles, quantity, &options, &path)
                .with_context(|| format!("Failed to plot {quantity}"))?;
            info!(path = %path.display(), "chart written");
        }
        eprintln!(
            "{} {} charts written to {}",
            style("OK").green().bold(),
            config.quantities.len(),
            output.display()
        );
    }

    // Print summary to stderr
    eprintln!();
    eprintln!("{}", style("Analysis Summary").bold().underlined());
    eprintln!(
        "  Bundles:     {} ({} reference simulations)",
        report.bundles.len(),
        cache.computations()
    );
    match &report.shared_rescaling {
        Some(rescaling) => eprintln!("  Rescaling:   {rescaling} (shared)"),
        None => eprintln!("  Rescaling:   per bundle"),
    }
    for bundle in &report.bundles {
        eprintln!(
            "  {:<12} {} instances, steps {:?}, rescaling {}",
            bundle.name, bundle.instances, bundle.steps, bundle.rescaling
        );
    }
    Ok(())
}
