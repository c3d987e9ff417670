//! Instance statistics and per-chain observables.

use ndarray::{Array1, Array2, Axis};

/// Mean, population standard deviation and standard error over instances.
///
/// All samples share one shape; at least one sample is required.
pub(crate) fn aggregate(samples: &[Array2<f64>]) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
    let n = samples.len().max(1) as f64;
    let shape = samples.first().map_or((0, 0), Array2::dim);

    let mut mean = Array2::<f64>::zeros(shape);
    for sample in samples {
        mean += sample;
    }
    mean /= n;

    let mut var = Array2::<f64>::zeros(shape);
    for sample in samples {
        let d = sample - &mean;
        var += &(&d * &d);
    }
    let std = var.mapv(|v| (v / n).sqrt());
    let stderr = std.mapv(|v| v / n.sqrt());
    (mean, std, stderr)
}

/// Site coordinates relative to the chain centre, `x_i = i - (L-1)/2`.
pub(crate) fn centred_positions(sites: usize) -> Array1<f64> {
    let centre = (sites as f64 - 1.0) / 2.0;
    Array1::from_iter((0..sites).map(|i| i as f64 - centre))
}

/// `Σ x_i ρ(i)` per row, as a single-column array.
pub(crate) fn position_average(density: &Array2<f64>) -> Array2<f64> {
    let x = centred_positions(density.ncols());
    density.dot(&x).insert_axis(Axis(1))
}

/// `Σ |x_i| ρ(i)` per row, as a single-column array.
pub(crate) fn spreading(density: &Array2<f64>) -> Array2<f64> {
    let x = centred_positions(density.ncols()).mapv(f64::abs);
    density.dot(&x).insert_axis(Axis(1))
}

/// Time derivative of every column.
///
/// Central differences inside, one-sided at both ends; a single row has
/// zero derivative.
pub(crate) fn time_derivative(values: &Array2<f64>, times: &[f64]) -> Array2<f64> {
    let rows = values.nrows();
    let mut out = Array2::<f64>::zeros(values.raw_dim());
    if rows < 2 {
        return out;
    }
    for row in 0..rows {
        let (lo, hi) = match row {
            0 => (0, 1),
            r if r == rows - 1 => (r - 1, r),
            r => (r - 1, r + 1),
        };
        let dt = times[hi] - times[lo];
        let diff = &values.row(hi) - &values.row(lo);
        out.row_mut(row).assign(&(diff / dt));
    }
    out
}
