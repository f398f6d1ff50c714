//! Grouped linear response fits.
//!
//! Each configuration group (dynamic range for VIS, range + photodiode
//! for IR) gets an ordinary least-squares line of raw value vs. gain,
//! provided the group has at least two distinct gain values with finite
//! targets. Groups below that threshold are reported without a fit.

use crate::core::loaders::Dataset;

/// A fitted degree-1 polynomial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// Evaluate the line at `x`.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit result for one VIS range group.
#[derive(Debug, Clone)]
pub struct VisGroupFit {
    /// Dynamic-range label of the group.
    pub range: String,
    /// (gain, vis) samples with a present VIS value.
    pub points: Vec<(f64, f64)>,
    /// OLS line, `None` when the group is unfittable.
    pub fit: Option<LineFit>,
}

impl VisGroupFit {
    /// Slope scaled back to the normal-range sensitivity.
    ///
    /// The high dynamic range divides the photodiode sensitivity by a
    /// fixed factor (14.5 on the Si1145), so slope * factor is the
    /// comparable normal-range slope.
    pub fn normal_equivalent_slope(&self, factor: f64) -> Option<f64> {
        self.fit.map(|f| f.slope * factor)
    }
}

/// Fit result for one IR (range, photodiode) group.
#[derive(Debug, Clone)]
pub struct IrGroupFit {
    /// Dynamic-range label of the group.
    pub range: String,
    /// IR photodiode label of the group.
    pub ir_photodiode: String,
    /// (gain, ir) samples with a present IR value.
    pub points: Vec<(f64, f64)>,
    /// OLS line, `None` when the group is unfittable.
    pub fit: Option<LineFit>,
}

/// Ordinary least-squares fit of y against x.
///
/// Non-finite pairs are dropped first. Returns `None` when fewer than
/// two distinct x values remain; a single gain level cannot constrain a
/// line and is not an error.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineFit> {
    let finite: Vec<(f64, f64)> = points
        .iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .copied()
        .collect();

    let mut xs: Vec<f64> = finite.iter().map(|(x, _)| *x).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();
    if xs.len() < 2 {
        return None;
    }

    let n = finite.len() as f64;
    let sum_x: f64 = finite.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = finite.iter().map(|(_, y)| y).sum();
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in &finite {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    Some(LineFit { slope, intercept })
}

/// Partition the dataset by range and fit the VIS response per group.
///
/// Groups come back in sorted range order, which also fixes the colour
/// assignment downstream.
pub fn fit_vis_groups(dataset: &Dataset) -> Vec<VisGroupFit> {
    dataset
        .ranges()
        .into_iter()
        .map(|range| {
            let points: Vec<(f64, f64)> = dataset
                .readings
                .iter()
                .filter(|r| r.range == range)
                .filter_map(|r| r.vis.map(|v| (r.gain, v)))
                .collect();
            let fit = fit_line(&points);
            VisGroupFit { range, points, fit }
        })
        .collect()
}

/// Partition the dataset by (range, photodiode) and fit the IR response
/// per group, in sorted key order.
pub fn fit_ir_groups(dataset: &Dataset) -> Vec<IrGroupFit> {
    dataset
        .range_photodiode_pairs()
        .into_iter()
        .map(|(range, ir_photodiode)| {
            let points: Vec<(f64, f64)> = dataset
                .readings
                .iter()
                .filter(|r| r.range == range && r.ir_photodiode == ir_photodiode)
                .filter_map(|r| r.ir.map(|v| (r.gain, v)))
                .collect();
            let fit = fit_line(&points);
            IrGroupFit {
                range,
                ir_photodiode,
                points,
                fit,
            }
        })
        .collect()
}
