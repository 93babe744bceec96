//! Immutable analyzer configuration.
//!
//! All calibration values (per-bucket plot ranges, color scale, marker size,
//! optional velocity filter) live here and are handed to the pipeline at
//! construction time. An optional `analyzer.toml` next to the log file can
//! override any subset of the defaults.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the simulation log when none is given on the command line,
/// resolved relative to the executable.
pub const DEFAULT_LOG_FILE: &str = "TechnicalFishPass.log";

/// Name of the optional configuration file looked up next to the log file.
pub const CONFIG_FILE_NAME: &str = "analyzer.toml";

/// Lateral plot range for one cross-section bucket.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisLimit {
    pub bucket: u32,
    pub left: f64,
    pub right: f64,
}

/// Calibration and output settings for one analyzer run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalyzerConfig {
    /// Directory receiving the section plots and the CSV report.
    pub output_dir: PathBuf,
    /// Upper end of the velocity color scale in m/s.
    pub velocity_scale_max: f64,
    /// Scatter marker radius.
    pub marker_radius: f64,
    /// Drop particles slower than `velocity_floor` before plotting. The
    /// report statistics always use the full particle set.
    pub filter_slow_particles: bool,
    /// Velocity threshold in m/s used when `filter_slow_particles` is set.
    pub velocity_floor: f64,
    /// Lateral plot range per cross-section bucket.
    pub axis_limits: Vec<AxisLimit>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let limit = |bucket, left, right| AxisLimit { bucket, left, right };
        Self {
            output_dir: PathBuf::from("."),
            velocity_scale_max: 1.6,
            marker_radius: 10.0,
            filter_slow_particles: false,
            velocity_floor: 0.03,
            axis_limits: vec![
                limit(11, -1.1, 1.3),
                limit(12, -1.1, 1.3),
                limit(21, -2.5, 1.4),
                limit(22, -2.5, 1.4),
                limit(31, -2.5, 1.4),
                limit(32, -2.5, 1.4),
                limit(41, -1.4, 1.3),
                limit(42, -1.4, 1.3),
            ],
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file. Missing fields keep their
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Configuration path derived from the log file location.
    pub fn config_path_for_log(log_path: &Path) -> PathBuf {
        log_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(CONFIG_FILE_NAME)
    }

    /// Default log path: [`DEFAULT_LOG_FILE`] next to the executable.
    pub fn default_log_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_LOG_FILE)
    }

    /// Lateral plot range for `bucket`, when one is configured.
    pub fn axis_range(&self, bucket: u32) -> Option<(f64, f64)> {
        self.axis_limits
            .iter()
            .find(|limit| limit.bucket == bucket)
            .map(|limit| (limit.left, limit.right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_range_lookup() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.axis_range(11), Some((-1.1, 1.3)));
        assert_eq!(config.axis_range(21), Some((-2.5, 1.4)));
        assert_eq!(config.axis_range(42), Some((-1.4, 1.3)));
        assert_eq!(config.axis_range(99), None);
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let config: AnalyzerConfig = toml::from_str(
            "velocity-scale-max = 2.0\nfilter-slow-particles = true\n",
        )
        .unwrap();
        assert_eq!(config.velocity_scale_max, 2.0);
        assert!(config.filter_slow_particles);
        assert_eq!(config.marker_radius, 10.0);
        assert_eq!(config.axis_limits.len(), 8);
    }

    #[test]
    fn axis_limits_override_from_toml() {
        let config: AnalyzerConfig = toml::from_str(
            "[[axis-limits]]\nbucket = 11\nleft = -2.0\nright = 2.0\n",
        )
        .unwrap();
        assert_eq!(config.axis_range(11), Some((-2.0, 2.0)));
        // replacing the table replaces the whole set
        assert_eq!(config.axis_range(21), None);
    }
}
