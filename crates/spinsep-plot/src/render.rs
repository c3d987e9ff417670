//! SVG drawing of laid-out panels.

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::PlotResult;

/// One line of a panel, with an optional band and exact reference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    /// Band half-width at each point.
    pub half_width: Option<Vec<f64>>,
    pub exact: Option<Vec<(f64, f64)>>,
}

impl Curve {
    /// Closed outline of the band: upper edge forwards, lower edge back.
    fn band_outline(&self) -> Option<Vec<(f64, f64)>> {
        let half_width = self.half_width.as_ref()?;
        let upper = self
            .points
            .iter()
            .zip(half_width)
            .map(|(&(x, y), &h)| (x, y + h));
        let lower = self
            .points
            .iter()
            .zip(half_width)
            .rev()
            .map(|(&(x, y), &h)| (x, y - h));
        Some(upper.chain(lower).collect())
    }
}

/// One chart panel per quantity series.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Panel {
    pub title: String,
    pub curves: Vec<Curve>,
}

impl Panel {
    fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for curve in &self.curves {
            xs.extend(curve.points.iter().map(|p| p.0));
            ys.extend(curve.points.iter().map(|p| p.1));
            if let Some(outline) = curve.band_outline() {
                ys.extend(outline.iter().map(|p| p.1));
            }
            if let Some(exact) = &curve.exact {
                ys.extend(exact.iter().map(|p| p.1));
            }
        }
        (padded(&xs), padded(&ys))
    }
}

fn padded(values: &[f64]) -> Range<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    let span = max - min;
    let pad = if span < 1e-12 { 0.5 } else { 0.05 * span };
    (min - pad)..(max + pad)
}

pub(crate) fn draw(
    panels: &[Panel],
    x_desc: &str,
    y_desc: &str,
    title: &str,
    size: (u32, u32),
    path: &Path,
) -> PlotResult<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(title, ("sans-serif", 24))?;
    let areas = body.split_evenly((1, panels.len().max(1)));
    for (panel, area) in panels.iter().zip(&areas) {
        draw_panel(panel, area, x_desc, y_desc)?;
    }
    root.present()?;
    Ok(())
}

fn draw_panel(
    panel: &Panel,
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    x_desc: &str,
    y_desc: &str,
) -> PlotResult<()> {
    let (x_range, y_range) = panel.bounds();
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;

    for (index, curve) in panel.curves.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        if let Some(outline) = curve.band_outline() {
            chart.draw_series(std::iter::once(Polygon::new(
                outline,
                color.mix(0.2).filled(),
            )))?;
        }
        if let Some(exact) = &curve.exact {
            chart.draw_series(DashedLineSeries::new(
                exact.clone(),
                6,
                4,
                color.stroke_width(1),
            ))?;
        }
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(2),
            ))?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(
            curve
                .points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}
