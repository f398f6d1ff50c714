//! Exposure sweep evaluation for visible/infrared light sensors.
//!
//! This crate provides tools for:
//! - Loading exposure sweep CSV files (gain, range, photodiode, raw values)
//! - Cleaning overflowed and known-bad readings
//! - Fitting a linear response per configuration group
//! - Rendering VIS and IR summary charts as SVG
//!
//! # Example
//!
//! ```no_run
//! use exposure_eval::core::loaders::load_exposure_csv;
//! use exposure_eval::processors::{cleaning, fitting};
//!
//! let mut dataset = load_exposure_csv("sweep.csv").unwrap();
//! cleaning::mask_overflow(&mut dataset, 65535.0);
//! let fits = fitting::fit_vis_groups(&dataset);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{CalibrationConfig, EvalConfig, PlotConfig, SensorConfig};
pub use core::loaders::{Dataset, Reading};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
