//! Data loader for exposure sweep CSV files.
//!
//! The expected format is the output of the sensor's exposure test mode:
//! a header row naming at least `gain`, `range`, `ir_photodiode`, `ir` and
//! `vis`, followed by one row per measurement. Column order is free and
//! extra columns are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One measurement row from an exposure sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Sensor amplification setting.
    pub gain: f64,
    /// Dynamic-range mode label (e.g. "low", "high").
    pub range: String,
    /// Which IR photodiode produced the reading (e.g. "small", "large").
    pub ir_photodiode: String,
    /// Raw IR channel value, `None` when missing or masked.
    pub ir: Option<f64>,
    /// Raw VIS channel value, `None` when missing or masked.
    pub vis: Option<f64>,
}

/// Container for a full exposure sweep.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Readings in file order.
    pub readings: Vec<Reading>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl Dataset {
    /// Creates a new empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of readings.
    #[inline]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns true if the dataset holds no readings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Distinct range labels in sorted order.
    pub fn ranges(&self) -> Vec<String> {
        let mut ranges: Vec<String> = self.readings.iter().map(|r| r.range.clone()).collect();
        ranges.sort();
        ranges.dedup();
        ranges
    }

    /// Distinct (range, ir_photodiode) pairs in sorted order.
    pub fn range_photodiode_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .readings
            .iter()
            .map(|r| (r.range.clone(), r.ir_photodiode.clone()))
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

/// Columns the loader requires to be present in the header.
const REQUIRED_COLUMNS: [&str; 5] = ["gain", "range", "ir_photodiode", "ir", "vis"];

/// Load an exposure sweep from a CSV file.
///
/// Columns are located by case-insensitive header name, so the sweep
/// generator is free to reorder them. Empty `ir`/`vis` cells become
/// missing values; any other unparseable numeric cell is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a required column is
/// absent, a numeric cell fails to parse, or the file holds no data rows.
pub fn load_exposure_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    // Map lowercase header names to column indices
    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !col_map.contains_key(**name))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    }

    let gain_idx = col_map["gain"];
    let range_idx = col_map["range"];
    let photodiode_idx = col_map["ir_photodiode"];
    let ir_idx = col_map["ir"];
    let vis_idx = col_map["vis"];

    let mut readings = Vec::with_capacity(64);

    for (row_num, result) in reader.records().enumerate() {
        let record = result?;

        let gain = parse_required(&record, gain_idx, "gain", row_num)?;
        let ir = parse_optional(&record, ir_idx, "ir", row_num)?;
        let vis = parse_optional(&record, vis_idx, "vis", row_num)?;

        let range = record
            .get(range_idx)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let ir_photodiode = record
            .get(photodiode_idx)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        readings.push(Reading {
            gain,
            range,
            ir_photodiode,
            ir,
            vis,
        });
    }

    if readings.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(Dataset {
        readings,
        source_path: Some(path.to_path_buf()),
    })
}

fn parse_required(record: &csv::StringRecord, idx: usize, name: &str, row: usize) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse().map_err(|_| {
        LoaderError::ParseError(format!("row {}: invalid {} value '{}'", row + 1, name, raw))
    })
}

fn parse_optional(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<Option<f64>> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| {
        LoaderError::ParseError(format!("row {}: invalid {} value '{}'", row + 1, name, raw))
    })
}
