//! Chart rendering for exposure sweeps.
//!
//! This module renders the two per-run SVG charts using the plotters
//! library: VIS response (mean +/- std-dev per gain, one colour per
//! range) and IR response (raw scatter, one colour per range/photodiode
//! pair), each overlaid with its fitted line when one exists.

use std::path::Path;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use thiserror::Error;

use crate::config::{CalibrationConfig, PlotConfig};
use crate::processors::aggregate::aggregate_by_gain;
use crate::processors::fitting::{IrGroupFit, LineFit, VisGroupFit};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("No data to plot")]
    EmptyDataset,

    #[error("Palette exhausted: {needed} groups but only {available} colours configured")]
    PaletteExhausted { needed: usize, available: usize },
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Marker radius for scatter points, in pixels.
const POINT_SIZE: u32 = 3;

/// Half-width of error bar whiskers, in pixels.
const WHISKER_WIDTH: u32 = 6;

fn palette_color(palette: &[[u8; 3]], index: usize, needed: usize) -> Result<RGBColor> {
    // The palette must cover every group; excess groups are a config error
    match palette.get(index) {
        Some(c) => Ok(RGBColor(c[0], c[1], c[2])),
        None => Err(VisualizationError::PaletteExhausted {
            needed,
            available: palette.len(),
        }),
    }
}

/// Plot the VIS response chart and save it as SVG.
///
/// One colour per range group in sorted order. Each gain level is drawn
/// as mean +/- population std-dev across its repeated samples; the
/// fitted line is overlaid when the group was fittable. Legend entries
/// embed the fit parameters, and for the high range additionally the
/// normal-range-equivalent slope.
pub fn plot_vis(
    output_path: &Path,
    groups: &[VisGroupFit],
    title: Option<&str>,
    calibration: &CalibrationConfig,
    config: &PlotConfig,
) -> Result<()> {
    if groups.is_empty() {
        return Err(VisualizationError::EmptyDataset);
    }

    // Bounds over means +/- spread, so whiskers stay inside the chart
    let mut extents = Extents::new();
    let mut group_stats = Vec::with_capacity(groups.len());
    for group in groups {
        let stats = aggregate_by_gain(&group.points);
        for s in &stats {
            extents.update(s.gain, s.mean - s.std_dev);
            extents.update(s.gain, s.mean + s.std_dev);
        }
        group_stats.push(stats);
    }
    let ((x_min, x_max), (y_min, y_max)) = extents.padded();

    let root = SVGBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 24));
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("gain")
        .y_desc("VIS raw value")
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (i, (group, stats)) in groups.iter().zip(&group_stats).enumerate() {
        let color = palette_color(&config.vis_colors, i, groups.len())?;

        let label = match group.fit {
            Some(fit) => {
                let mut label = format!(
                    "Range {}: {:.2}*gain + {:.2}",
                    group.range, fit.slope, fit.intercept
                );
                if group.range.eq_ignore_ascii_case(&calibration.high_range_label) {
                    let scaled = fit.slope * calibration.high_range_factor;
                    label.push_str(&format!(
                        " (x{}: {:.2})",
                        calibration.high_range_factor, scaled
                    ));
                }
                label
            }
            None => format!("Range {} (no fit)", group.range),
        };

        chart
            .draw_series(stats.iter().map(|s| {
                ErrorBar::new_vertical(
                    s.gain,
                    s.mean - s.std_dev,
                    s.mean,
                    s.mean + s.std_dev,
                    color.filled(),
                    WHISKER_WIDTH,
                )
            }))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));

        if let Some(fit) = group.fit {
            draw_fit_line(&mut chart, &fit, x_min, x_max, color)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

/// Plot the IR response chart and save it as SVG.
///
/// One colour per (range, photodiode) group in sorted order. Every raw
/// reading is drawn as a scatter point; the fitted line is overlaid
/// when available.
pub fn plot_ir(
    output_path: &Path,
    groups: &[IrGroupFit],
    title: Option<&str>,
    config: &PlotConfig,
) -> Result<()> {
    if groups.is_empty() {
        return Err(VisualizationError::EmptyDataset);
    }

    let mut extents = Extents::new();
    for group in groups {
        for (x, y) in &group.points {
            extents.update(*x, *y);
        }
    }
    let ((x_min, x_max), (y_min, y_max)) = extents.padded();

    let root = SVGBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 24));
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("gain")
        .y_desc("IR raw value")
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (i, group) in groups.iter().enumerate() {
        let color = palette_color(&config.ir_colors, i, groups.len())?;

        let label = match group.fit {
            Some(fit) => format!(
                "IR photodiode {}, range {}: {:.2}*gain + {:.2}",
                group.ir_photodiode, group.range, fit.slope, fit.intercept
            ),
            None => format!(
                "IR photodiode {}, range {} (no fit)",
                group.ir_photodiode, group.range
            ),
        };

        chart
            .draw_series(
                group
                    .points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), POINT_SIZE, color.filled())),
            )
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));

        if let Some(fit) = group.fit {
            draw_fit_line(&mut chart, &fit, x_min, x_max, color)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}

fn draw_fit_line<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    fit: &LineFit,
    x_min: f64,
    x_max: f64,
    color: RGBColor,
) -> Result<()> {
    chart
        .draw_series(LineSeries::new(
            [(x_min, fit.eval(x_min)), (x_max, fit.eval(x_max))],
            color.stroke_width(2),
        ))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    Ok(())
}

/// Running min/max tracker for chart bounds.
struct Extents {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Extents {
    fn new() -> Self {
        Self {
            x_min: f64::MAX,
            x_max: f64::MIN,
            y_min: f64::MAX,
            y_max: f64::MIN,
        }
    }

    fn update(&mut self, x: f64, y: f64) {
        if x < self.x_min {
            self.x_min = x;
        }
        if x > self.x_max {
            self.x_max = x;
        }
        if y < self.y_min {
            self.y_min = y;
        }
        if y > self.y_max {
            self.y_max = y;
        }
    }

    /// Bounds with 5% padding; degenerate spans get a unit margin.
    ///
    /// A tracker that never saw a point yields a unit frame, so a fully
    /// masked channel still renders an empty chart.
    fn padded(&self) -> ((f64, f64), (f64, f64)) {
        if self.x_min > self.x_max {
            return ((0.0, 1.0), (0.0, 1.0));
        }

        let (mut x_min, mut x_max) = (self.x_min, self.x_max);
        let (mut y_min, mut y_max) = (self.y_min, self.y_max);

        if (x_max - x_min).abs() < f64::EPSILON {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if (y_max - y_min).abs() < f64::EPSILON {
            y_min -= 1.0;
            y_max += 1.0;
        }

        let x_pad = (x_max - x_min) * 0.05;
        let y_pad = (y_max - y_min) * 0.05;

        ((x_min - x_pad, x_max + x_pad), (y_min - y_pad, y_max + y_pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vis_group(range: &str, points: Vec<(f64, f64)>) -> VisGroupFit {
        let fit = crate::processors::fitting::fit_line(&points);
        VisGroupFit {
            range: range.to_string(),
            points,
            fit,
        }
    }

    #[test]
    fn test_plot_vis_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep_vis.svg");

        let groups = vec![
            vis_group("high", vec![(1.0, 10.0), (2.0, 20.0), (4.0, 40.0)]),
            vis_group("low", vec![(1.0, 100.0), (2.0, 210.0), (2.0, 190.0)]),
        ];

        plot_vis(
            &path,
            &groups,
            Some("sweep"),
            &CalibrationConfig::default(),
            &PlotConfig::default(),
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_plot_ir_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep_ir.svg");

        let points = vec![(1.0, 5.0), (2.0, 9.0), (4.0, 17.0)];
        let groups = vec![IrGroupFit {
            range: "low".to_string(),
            ir_photodiode: "small".to_string(),
            fit: crate::processors::fitting::fit_line(&points),
            points,
        }];

        plot_ir(&path, &groups, None, &PlotConfig::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_palette_exhaustion_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep_vis.svg");

        let groups = vec![
            vis_group("a", vec![(1.0, 1.0)]),
            vis_group("b", vec![(1.0, 2.0)]),
            vis_group("c", vec![(1.0, 3.0)]),
        ];

        let config = PlotConfig {
            vis_colors: vec![[0, 0, 0], [1, 1, 1]],
            ..PlotConfig::default()
        };

        let err = plot_vis(
            &path,
            &groups,
            None,
            &CalibrationConfig::default(),
            &config,
        )
        .unwrap_err();

        match err {
            VisualizationError::PaletteExhausted { needed, available } => {
                assert_eq!(needed, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_groups_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_vis.svg");

        let err = plot_vis(
            &path,
            &[],
            None,
            &CalibrationConfig::default(),
            &PlotConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, VisualizationError::EmptyDataset));
    }

    #[test]
    fn test_groups_without_points_still_render() {
        // A fully masked channel leaves groups with no samples; the
        // chart must still be written with its "no fit" legend entries
        let dir = tempdir().unwrap();
        let path = dir.path().join("masked_ir.svg");

        let groups = vec![
            IrGroupFit {
                range: "high".to_string(),
                ir_photodiode: "small".to_string(),
                points: vec![],
                fit: None,
            },
            IrGroupFit {
                range: "low".to_string(),
                ir_photodiode: "small".to_string(),
                points: vec![],
                fit: None,
            },
        ];

        plot_ir(&path, &groups, None, &PlotConfig::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
        assert!(content.contains("no fit"));
    }
}
