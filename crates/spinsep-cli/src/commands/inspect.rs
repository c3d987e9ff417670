//! Inspect command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use spinsep_analysis::{InstanceBundle, Quantity};
use spinsep_data::{ExperimentResult, group_compatible, load_dataset};

/// Execute the inspect command on a file or a data directory.
pub fn execute(input: &str) -> Result<()> {
    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("File not found: {input}");
    }
    if path.is_dir() {
        inspect_dataset(path)
    } else {
        let experiment = ExperimentResult::load(path)
            .with_context(|| format!("Failed to load experiment: {input}"))?;
        inspect_experiment(&experiment)
    }
}

fn inspect_experiment(experiment: &ExperimentResult) -> Result<()> {
    let params = &experiment.parameters;
    println!("{}", style(&experiment.name).bold().underlined());
    if let Some(processor) = &experiment.processor {
        println!("  Processor:   {processor}");
    }
    println!(
        "  Chains:      {} sites, {} up / {} down",
        params.sites_count(),
        params.particles_up(),
        params.particles_down()
    );
    println!(
        "  Couplings:   J = {:?}, U = {:?}",
        params.hamiltonian.j_values(),
        params.hamiltonian.u_values()
    );
    println!("  dt:          {}", params.dt);
    println!("  Layout:      {}", params.layout.label());
    if let Some(angle) = params.parasitic_cphase {
        println!("  Parasitic:   {angle} rad");
    }

    let bundle = InstanceBundle::new(vec![experiment.clone()])?;
    let post_selection = bundle.quantity(Quantity::PostSelection)?;
    let rates = post_selection
        .series("value")
        .map(|s| s.mean.column(0).to_vec())
        .unwrap_or_default();

    println!();
    println!("  {:>5}  {:>8}  {:>9}  {:>10}", "step", "shots", "outcomes", "post-sel.");
    for (index, step) in bundle.steps().iter().enumerate() {
        let Some(run) = experiment.run(*step) else {
            continue;
        };
        let rate = rates.get(index).copied().unwrap_or(f64::NAN);
        println!(
            "  {:>5}  {:>8}  {:>9}  {:>9.1}%",
            step,
            run.counts.total_shots(),
            run.counts.len(),
            100.0 * rate
        );
    }
    Ok(())
}

fn inspect_dataset(root: &Path) -> Result<()> {
    let dataset = load_dataset(root)
        .with_context(|| format!("Failed to load dataset: {}", root.display()))?;
    println!(
        "{} ({} experiments)",
        style(root.display()).bold().underlined(),
        dataset.experiments_count()
    );
    for group in dataset.into_groups() {
        let count = group.experiments.len();
        let layouts: Vec<String> = group
            .experiments
            .iter()
            .map(|e| e.parameters.layout.label())
            .collect();
        let bundles = group_compatible(group.experiments).len();
        println!(
            "  {:<10} {} experiments, {} bundle(s)",
            style(&group.label).cyan(),
            count,
            bundles
        );
        println!("             {}", style(layouts.join(", ")).dim());
    }
    Ok(())
}
