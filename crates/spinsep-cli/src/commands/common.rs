//! Shared helpers for CLI commands.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use spinsep_analysis::Quantity;
use spinsep_data::{
    ChainInitialState, FermiHubbardParameters, Hamiltonian, IndependentChainsInitialState, Layout,
};

/// Parse a comma-separated list of interaction strengths, keeping each
/// token as the group label.
pub fn parse_u_list(list: &str) -> Result<Vec<(String, f64)>> {
    let values = list
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            let u: f64 = token
                .parse()
                .with_context(|| format!("Invalid interaction strength: '{token}'"))?;
            if !u.is_finite() {
                anyhow::bail!("Interaction strength must be finite, got '{token}'");
            }
            Ok((token.to_string(), u))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        anyhow::bail!("No interaction strengths given");
    }
    Ok(values)
}

/// Parse quantity names.
pub fn parse_quantities(names: &[String]) -> Result<Vec<Quantity>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Quantity>().with_context(|| {
                let known: Vec<_> = Quantity::ALL.iter().map(|q| q.name()).collect();
                format!("Available quantities: {}", known.join(", "))
            })
        })
        .collect()
}

/// Chains of `sites` sites with `particles` fermions per spin, both prepared
/// in the same centred Gaussian trap.
pub fn trapped_parameters(
    sites: usize,
    particles: usize,
    u: f64,
    dt: f64,
    parasitic_cphase: Option<f64>,
) -> FermiHubbardParameters {
    let trap = ChainInitialState::GaussianTrappingPotential {
        particles,
        center: 0.5,
        sigma: 1.0 / 7.0,
        scale: -4.0,
    };
    let mut params = FermiHubbardParameters::new(
        Hamiltonian::new(sites, 1.0, u),
        IndependentChainsInitialState::new(trap.clone(), trap),
        Layout::zigzag(sites, [0, 1]),
        dt,
    );
    params.parasitic_cphase = parasitic_cphase;
    params
}

/// Layout of the `index`-th instance: zig-zags shifted down the grid and
/// rotated in quarter turns.
pub fn instance_layout(sites: usize, index: usize) -> Layout {
    let row = i32::try_from(index / 4).unwrap_or(i32::MAX);
    let rotation = u16::try_from((index % 4) * 90).unwrap_or(0);
    Layout::zigzag(sites, [row, 1]).with_rotation(rotation)
}

/// Progress bar counting `len` units of work.
pub fn progress_bar(len: u64, message: impl Into<String>) -> Result<ProgressBar> {
    Ok(ProgressBar::new(len)
        .with_style(bar_style()?)
        .with_message(message.into()))
}

/// Style shared by every progress bar.
pub fn bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg:<24} [{bar:30.cyan/blue}] {pos}/{len}")?
        .progress_chars("=> "))
}
