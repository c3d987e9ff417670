//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - spin-charge separation analysis for Fermi-Hubbard experiments",
        style("spinsep").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  spinsep-data      Experiment records and problem parameters");
    println!("  spinsep-sim       Trotterised reference simulation and sampling");
    println!("  spinsep-analysis  Bundles, quantities and shared rescaling");
    println!("  spinsep-plot      SVG charts");
    println!("  spinsep-cli       Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/hiq-lab/spinsep").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
