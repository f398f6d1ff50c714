//! Command-line interface for the exposure evaluation pipeline.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;

use crate::config::EvalConfig;
use crate::core::loaders;
use crate::processors::{cleaning, fitting};
use crate::visualization;

#[derive(Parser)]
#[command(name = "exposure-eval")]
#[command(about = "Evaluate light sensor exposure sweeps", version)]
pub struct Cli {
    /// Exposure sweep CSV file to evaluate
    input_csv: Option<PathBuf>,

    /// Optional chart title
    title: Option<String>,

    /// Path to YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        println!("║ {:<20}: {:<39} ║", key, truncate_value(value, 39));
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Shorten a summary value to `max` characters, never splitting a
/// multibyte character.
fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match EvalConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                EvalConfig::default()
            }
        },
        None => EvalConfig::default(),
    };

    let Some(input_csv) = cli.input_csv else {
        eprintln!("No datafile");
        std::process::exit(1);
    };

    if let Err(e) = cmd_evaluate(&input_csv, cli.title.as_deref(), &config) {
        error!("Evaluation failed: {:#}", e);
        std::process::exit(1);
    }
}

fn cmd_evaluate(
    input_csv: &PathBuf,
    title: Option<&str>,
    config: &EvalConfig,
) -> anyhow::Result<()> {
    let start = Instant::now();

    let spinner = create_spinner("Loading exposure sweep...");

    let mut dataset = loaders::load_exposure_csv(input_csv)
        .with_context(|| format!("loading {}", input_csv.display()))?;

    cleaning::mask_overflow(&mut dataset, config.sensor.overflow_sentinel);
    cleaning::mask_bad_combos(&mut dataset, &config.sensor.bad_vis_combos);
    debug!(
        "Loaded {} readings across ranges {:?}",
        dataset.len(),
        dataset.ranges()
    );

    spinner.set_message("Fitting response curves...");

    let vis_groups = fitting::fit_vis_groups(&dataset);
    let ir_groups = fitting::fit_ir_groups(&dataset);

    spinner.finish_and_clear();

    // One summary line per group
    let mut fitted = 0usize;
    for group in &vis_groups {
        match group.fit {
            Some(fit) => {
                fitted += 1;
                let mut line = format!(
                    "VIS range {}: slope {:.6}, intercept {:.6}",
                    group.range, fit.slope, fit.intercept
                );
                if group
                    .range
                    .eq_ignore_ascii_case(&config.calibration.high_range_label)
                {
                    let scaled = fit.slope * config.calibration.high_range_factor;
                    line.push_str(&format!(
                        " (x{} normal-range equivalent {:.6})",
                        config.calibration.high_range_factor, scaled
                    ));
                }
                println!("{line}");
            }
            None => println!(
                "VIS range {}: no fit ({} samples)",
                group.range,
                group.points.len()
            ),
        }
    }
    for group in &ir_groups {
        match group.fit {
            Some(fit) => {
                fitted += 1;
                println!(
                    "IR photodiode {}, range {}: slope {:.6}, intercept {:.6}",
                    group.ir_photodiode, group.range, fit.slope, fit.intercept
                );
            }
            None => println!(
                "IR photodiode {}, range {}: no fit ({} samples)",
                group.ir_photodiode,
                group.range,
                group.points.len()
            ),
        }
    }

    // Output file names append a fixed suffix to the input path
    let vis_path = PathBuf::from(format!("{}_vis.svg", input_csv.display()));
    let ir_path = PathBuf::from(format!("{}_ir.svg", input_csv.display()));

    let spinner = create_spinner("Rendering charts...");

    visualization::plot_vis(
        &vis_path,
        &vis_groups,
        title,
        &config.calibration,
        &config.plot,
    )
    .with_context(|| format!("rendering {}", vis_path.display()))?;

    visualization::plot_ir(&ir_path, &ir_groups, title, &config.plot)
        .with_context(|| format!("rendering {}", ir_path.display()))?;

    spinner.finish_and_clear();

    show_charts(&[&vis_path, &ir_path]);

    let vis_samples: usize = vis_groups.iter().map(|g| g.points.len()).sum();
    let ir_samples: usize = ir_groups.iter().map(|g| g.points.len()).sum();

    print_summary(
        "Exposure Evaluation Complete",
        &[
            ("Input file", input_csv.display().to_string()),
            ("Readings", dataset.len().to_string()),
            ("VIS samples", vis_samples.to_string()),
            ("IR samples", ir_samples.to_string()),
            (
                "Groups",
                format!("{} ({} fitted)", vis_groups.len() + ir_groups.len(), fitted),
            ),
            ("VIS chart", vis_path.display().to_string()),
            ("IR chart", ir_path.display().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

/// Open rendered charts in the default viewer when a display is present.
///
/// Best-effort only; failures are logged and ignored.
fn show_charts(paths: &[&PathBuf]) {
    let has_display =
        std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some();
    if !has_display {
        debug!("No display available, skipping interactive view");
        return;
    }

    for path in paths {
        match std::process::Command::new("xdg-open").arg(path).spawn() {
            Ok(_) => info!("Opened {}", path.display()),
            Err(e) => debug!("Could not open {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_truncate_value_multibyte() {
        assert_eq!(truncate_value("short", 39), "short");

        // Long non-ASCII path must truncate on char boundaries
        let long = "messung_übersicht_äußerst_lange_datei_gehört_hierhin.csv";
        let truncated = truncate_value(long, 39);
        assert_eq!(truncated.chars().count(), 39);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_cmd_evaluate_end_to_end() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("sweep.csv");

        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "range,gain,ir_photodiode,vis,ir").unwrap();
        writeln!(file, "low,1,small,10,5").unwrap();
        writeln!(file, "low,2,small,20,9").unwrap();
        writeln!(file, "high,1,small,100,50").unwrap();
        file.flush().unwrap();

        let config = EvalConfig::default();
        cmd_evaluate(&csv_path, Some("sweep"), &config).unwrap();

        let vis_path = PathBuf::from(format!("{}_vis.svg", csv_path.display()));
        let ir_path = PathBuf::from(format!("{}_ir.svg", csv_path.display()));
        assert!(vis_path.exists());
        assert!(ir_path.exists());
    }
}
