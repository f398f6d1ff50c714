//! Configuration types for the exposure evaluation pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A (gain, range) combination whose visible-channel readings are known
/// to be unreliable and must be discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadVisCombo {
    /// Gain setting of the affected combination.
    pub gain: f64,

    /// Dynamic-range label of the affected combination.
    pub range: String,
}

/// Configuration for sensor data cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Raw value the sensor reports on overflow/saturation.
    #[serde(default = "default_overflow_sentinel")]
    pub overflow_sentinel: f64,

    /// Configurations whose VIS readings are discarded unconditionally.
    #[serde(default = "default_bad_vis_combos")]
    pub bad_vis_combos: Vec<BadVisCombo>,
}

fn default_overflow_sentinel() -> f64 {
    65535.0
}

fn default_bad_vis_combos() -> Vec<BadVisCombo> {
    // Empirical: gain 128 in high range intermittently returns garbage
    // on the VIS channel.
    vec![BadVisCombo {
        gain: 128.0,
        range: "high".to_string(),
    }]
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            overflow_sentinel: default_overflow_sentinel(),
            bad_vis_combos: default_bad_vis_combos(),
        }
    }
}

/// Configuration for calibration reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Sensitivity ratio between the normal and high dynamic range.
    ///
    /// The high range divides the photodiode sensitivity by this factor,
    /// so slope * factor gives the normal-range-equivalent slope.
    #[serde(default = "default_high_range_factor")]
    pub high_range_factor: f64,

    /// Range label the factor applies to.
    #[serde(default = "default_high_range_label")]
    pub high_range_label: String,
}

fn default_high_range_factor() -> f64 {
    14.5
}

fn default_high_range_label() -> String {
    "high".to_string()
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            high_range_factor: default_high_range_factor(),
            high_range_label: default_high_range_label(),
        }
    }
}

/// Configuration for chart rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Chart width in pixels.
    #[serde(default = "default_plot_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_plot_height")]
    pub height: u32,

    /// RGB palette for VIS range groups, assigned in sorted key order.
    #[serde(default = "default_vis_colors")]
    pub vis_colors: Vec<[u8; 3]>,

    /// RGB palette for IR (range, photodiode) groups, assigned in sorted
    /// key order.
    #[serde(default = "default_ir_colors")]
    pub ir_colors: Vec<[u8; 3]>,
}

fn default_plot_width() -> u32 {
    1024
}

fn default_plot_height() -> u32 {
    768
}

fn default_vis_colors() -> Vec<[u8; 3]> {
    vec![
        [0, 114, 255], // blue
        [228, 26, 28], // red
    ]
}

fn default_ir_colors() -> Vec<[u8; 3]> {
    vec![
        [0, 114, 255], // blue
        [0, 206, 209], // cyan
        [228, 26, 28], // red
        [255, 127, 0], // orange
    ]
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            height: default_plot_height(),
            vis_colors: default_vis_colors(),
            ir_colors: default_ir_colors(),
        }
    }
}

/// Main configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl EvalConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: EvalConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sensor_config() {
        let config = SensorConfig::default();
        assert_eq!(config.overflow_sentinel, 65535.0);
        assert_eq!(config.bad_vis_combos.len(), 1);
        assert_eq!(config.bad_vis_combos[0].gain, 128.0);
        assert_eq!(config.bad_vis_combos[0].range, "high");
    }

    #[test]
    fn test_default_eval_config() {
        let config = EvalConfig::default();
        assert_eq!(config.calibration.high_range_factor, 14.5);
        assert_eq!(config.plot.vis_colors.len(), 2);
        assert_eq!(config.plot.ir_colors.len(), 4);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = EvalConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: EvalConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.sensor.overflow_sentinel,
            config.sensor.overflow_sentinel
        );
        assert_eq!(parsed.calibration.high_range_label, "high");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: EvalConfig = serde_yaml::from_str("plot:\n  width: 640\n").unwrap();
        assert_eq!(parsed.plot.width, 640);
        assert_eq!(parsed.plot.height, 768);
        assert_eq!(parsed.sensor.overflow_sentinel, 65535.0);
    }
}
