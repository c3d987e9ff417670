//! `spinsep-plot` — SVG charts of analysis quantities.
//!
//! Density quantities are drawn as site profiles at a few selected Trotter
//! steps; every other quantity is drawn as a trajectory over time. Each
//! series of the quantity (`up`/`down`, `charge`/`spin` or `value`) gets its
//! own panel, and each bundle its own colour.
//!
//! ```rust,no_run
//! use spinsep_analysis::{InstanceBundle, Quantity};
//! use spinsep_plot::{PlotOptions, plot_quantity};
//!
//! # fn bundles() -> Vec<InstanceBundle> { unimplemented!() }
//! let bundles = bundles();
//! plot_quantity(
//!     &bundles,
//!     Quantity::ChargeSpinSpreading,
//!     &PlotOptions::default(),
//!     std::path::Path::new("spreading.svg"),
//! )
//! .unwrap();
//! ```

mod error;
mod render;

pub use error::{PlotError, PlotResult};
pub use spinsep_analysis::ErrorBand;

use std::path::Path;

use ndarray::Array2;
use spinsep_analysis::{InstanceBundle, Quantity, QuantityData};
use tracing::{debug, info};

use render::{Curve, Panel};

/// How a quantity is laid out on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Value per site, one line per bundle and selected step.
    Profile,
    /// Value per time, one line per bundle.
    Trajectory,
}

impl ChartKind {
    /// Chart kind used for `quantity`.
    pub fn for_quantity(quantity: Quantity) -> Self {
        if quantity.is_profile() {
            ChartKind::Profile
        } else {
            ChartKind::Trajectory
        }
    }

    fn x_label(self) -> &'static str {
        match self {
            ChartKind::Profile => "site",
            ChartKind::Trajectory => "time",
        }
    }
}

/// Rendering options for [`plot_quantity`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    /// Spread drawn around each mean.
    pub error_band: ErrorBand,
    /// Draw the exact reference as a dashed line where one exists.
    pub show_exact: bool,
    /// Steps shown on profile charts; first, middle and last by default.
    pub steps: Option<Vec<usize>>,
    /// Canvas size in pixels.
    pub size: (u32, u32),
    /// Chart title; the quantity name by default.
    pub title: Option<String>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            error_band: ErrorBand::StdDev,
            show_exact: true,
            steps: None,
            size: (1200, 600),
            title: None,
        }
    }
}

/// Render `quantity` of every bundle into an SVG file at `path`.
pub fn plot_quantity(
    bundles: &[InstanceBundle],
    quantity: Quantity,
    options: &PlotOptions,
    path: &Path,
) -> PlotResult<()> {
    if bundles.is_empty() {
        return Err(PlotError::NoBundles);
    }
    let data = bundles
        .iter()
        .map(|bundle| Ok((bundle.name(), bundle.quantity(quantity)?)))
        .collect::<PlotResult<Vec<_>>>()?;
    check_widths(quantity, &data)?;

    let kind = ChartKind::for_quantity(quantity);
    let panels = match kind {
        ChartKind::Profile => profile_panels(quantity, &data, options)?,
        ChartKind::Trajectory => trajectory_panels(quantity, &data, options),
    };
    debug!(%quantity, ?kind, panels = panels.len(), "laid out chart");

    let title = options.title.as_deref().unwrap_or(quantity.name());
    render::draw(
        &panels,
        kind.x_label(),
        quantity.axis_label(),
        title,
        options.size,
        path,
    )?;
    info!(%quantity, bundles = bundles.len(), path = %path.display(), "wrote chart");
    Ok(())
}

/// First, middle and last of `steps`, without repeats.
pub fn default_profile_steps(steps: &[usize]) -> Vec<usize> {
    let (Some(&first), Some(&last)) = (steps.first(), steps.last()) else {
        return Vec::new();
    };
    let mut selected = vec![first, steps[steps.len() / 2], last];
    selected.dedup();
    selected
}

fn check_widths(quantity: Quantity, data: &[(&str, QuantityData)]) -> PlotResult<()> {
    let expected = data[0].1.width();
    for (bundle, data) in &data[1..] {
        if data.width() != expected {
            return Err(PlotError::WidthMismatch {
                bundle: bundle.to_string(),
                quantity,
                expected,
                found: data.width(),
            });
        }
    }
    Ok(())
}

fn trajectory_panels(
    quantity: Quantity,
    data: &[(&str, QuantityData)],
    options: &PlotOptions,
) -> Vec<Panel> {
    quantity
        .series_names()
        .iter()
        .map(|&name| {
            let curves = data
                .iter()
                .filter_map(|(bundle, data)| {
                    let series = data.series(name)?;
                    let along_time = |values: &Array2<f64>| -> Vec<(f64, f64)> {
                        data.times
                            .iter()
                            .copied()
                            .zip(values.column(0).iter().copied())
                            .collect()
                    };
                    Some(Curve {
                        label: bundle.to_string(),
                        points: along_time(&series.mean),
                        half_width: series
                            .band(options.error_band)
                            .map(|band| band.column(0).to_vec()),
                        exact: series
                            .exact
                            .as_ref()
                            .filter(|_| options.show_exact)
                            .map(along_time),
                    })
                })
                .collect();
            Panel {
                title: name.to_string(),
                curves,
            }
        })
        .collect()
}

fn profile_panels(
    quantity: Quantity,
    data: &[(&str, QuantityData)],
    options: &PlotOptions,
) -> PlotResult<Vec<Panel>> {
    let steps = match &options.steps {
        Some(steps) => steps.clone(),
        None => default_profile_steps(&data[0].1.steps),
    };
    let mut rows = Vec::with_capacity(data.len());
    for (bundle, data) in data {
        let indices = steps
            .iter()
            .map(|&step| {
                data.steps
                    .iter()
                    .position(|&s| s == step)
                    .ok_or_else(|| PlotError::MissingStep {
                        step,
                        bundle: bundle.to_string(),
                    })
            })
            .collect::<PlotResult<Vec<_>>>()?;
        rows.push(indices);
    }

    let mut panels = Vec::new();
    for &name in quantity.series_names() {
        let mut curves = Vec::new();
        for ((bundle, data), indices) in data.iter().zip(&rows) {
            let Some(series) = data.series(name) else {
                continue;
            };
            for (&step, &row) in steps.iter().zip(indices) {
                let along_sites = |values: &Array2<f64>| -> Vec<(f64, f64)> {
                    values
                        .row(row)
                        .iter()
                        .enumerate()
                        .map(|(site, &v)| (site as f64, v))
                        .collect()
                };
                curves.push(Curve {
                    label: format!("{bundle} k={step}"),
                    points: along_sites(&series.mean),
                    half_width: series
                        .band(options.error_band)
                        .map(|band| band.row(row).to_vec()),
                    exact: series
                        .exact
                        .as_ref()
                        .filter(|_| options.show_exact)
                        .map(along_sites),
                });
            }
        }
        panels.push(Panel {
            title: name.to_string(),
            curves,
        });
    }
    Ok(panels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use spinsep_analysis::Series;

    fn trajectory(mean: f64) -> QuantityData {
        let series = |name: &str| Series {
            name: name.into(),
            mean: array![[mean], [mean + 1.0]],
            std: array![[0.1], [0.2]],
            stderr: array![[0.05], [0.1]],
            exact: Some(array![[mean], [mean]]),
        };
        QuantityData {
            quantity: Quantity::UpDownSpreading,
            steps: vec![0, 1],
            times: vec![0.0, 0.3],
            instances: 4,
            series: vec![series("up"), series("down")],
        }
    }

    fn profile(steps: Vec<usize>, sites: usize) -> QuantityData {
        let rows = steps.len();
        let series = |name: &str| Series {
            name: name.into(),
            mean: Array2::from_elem((rows, sites), 0.5),
            std: Array2::from_elem((rows, sites), 0.1),
            stderr: Array2::from_elem((rows, sites), 0.05),
            exact: None,
        };
        QuantityData {
            quantity: Quantity::ChargeSpinDensity,
            times: steps.iter().map(|&k| k as f64 * 0.3).collect(),
            steps,
            instances: 2,
            series: vec![series("charge"), series("spin")],
        }
    }

    #[test]
    fn test_chart_kind() {
        assert_eq!(
            ChartKind::for_quantity(Quantity::UpDownDensity),
            ChartKind::Profile
        );
        assert_eq!(
            ChartKind::for_quantity(Quantity::ChargeSpinDensity),
            ChartKind::Profile
        );
        assert_eq!(
            ChartKind::for_quantity(Quantity::Scaling),
            ChartKind::Trajectory
        );
        assert_eq!(
            ChartKind::for_quantity(Quantity::UpDownSpreadingDt),
            ChartKind::Trajectory
        );
    }

    #[test]
    fn test_default_profile_steps() {
        assert_eq!(default_profile_steps(&[0, 1, 2, 3, 4]), vec![0, 2, 4]);
        assert_eq!(default_profile_steps(&[0, 5]), vec![0, 5]);
        assert_eq!(default_profile_steps(&[7]), vec![7]);
        assert!(default_profile_steps(&[]).is_empty());
    }

    #[test]
    fn test_trajectory_panels() {
        let data = vec![("a", trajectory(1.0)), ("b", trajectory(2.0))];
        let options = PlotOptions {
            error_band: ErrorBand::StdError,
            ..Default::default()
        };
        let panels = trajectory_panels(Quantity::UpDownSpreading, &data, &options);
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].title, "up");
        let curve = &panels[0].curves[1];
        assert_eq!(curve.label, "b");
        assert_eq!(curve.points, vec![(0.0, 2.0), (0.3, 3.0)]);
        assert_eq!(curve.half_width, Some(vec![0.05, 0.1]));
        assert_eq!(curve.exact, Some(vec![(0.0, 2.0), (0.3, 2.0)]));
    }

    #[test]
    fn test_trajectory_without_band_or_exact() {
        let data = vec![("a", trajectory(1.0))];
        let options = PlotOptions {
            error_band: ErrorBand::None,
            show_exact: false,
            ..Default::default()
        };
        let panels = trajectory_panels(Quantity::UpDownSpreading, &data, &options);
        assert!(panels[1].curves[0].half_width.is_none());
        assert!(panels[1].curves[0].exact.is_none());
    }

    #[test]
    fn test_profile_panels_select_steps() {
        let data = vec![("a", profile(vec![0, 1, 2, 3, 4], 3))];
        let panels =
            profile_panels(Quantity::ChargeSpinDensity, &data, &PlotOptions::default()).unwrap();
        let labels: Vec<_> = panels[0].curves.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["a k=0", "a k=2", "a k=4"]);
        assert_eq!(
            panels[1].curves[0].points,
            vec![(0.0, 0.5), (1.0, 0.5), (2.0, 0.5)]
        );
    }

    #[test]
    fn test_profile_missing_step() {
        let data = vec![("a", profile(vec![0, 1], 3))];
        let options = PlotOptions {
            steps: Some(vec![1, 9]),
            ..Default::default()
        };
        let err = profile_panels(Quantity::ChargeSpinDensity, &data, &options).unwrap_err();
        assert!(matches!(err, PlotError::MissingStep { step: 9, .. }));
    }

    #[test]
    fn test_width_mismatch() {
        let data = vec![("a", profile(vec![0], 3)), ("b", profile(vec![0], 4))];
        let err = check_widths(Quantity::ChargeSpinDensity, &data).unwrap_err();
        assert!(matches!(
            err,
            PlotError::WidthMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }
}
