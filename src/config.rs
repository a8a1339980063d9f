//! Analytics Configuration Module
//!
//! Detection and analysis thresholds loaded from a TOML file, replacing
//! hardcoded statistical constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `LOSS_ANALYTICS_CONFIG` environment variable (path to TOML file)
//! 2. `analytics.toml` in the current working directory
//! 3. Built-in defaults (matching the platform's standard thresholds)
//!
//! The loaded config is plain data passed into the engine at construction;
//! there is no process-wide configuration singleton.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file path.
pub const CONFIG_ENV_VAR: &str = "LOSS_ANALYTICS_CONFIG";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "analytics.toml";

/// All tunable thresholds for the analytics engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub detection: DetectionThresholds,
    pub patterns: PatternThresholds,
    pub multivariate: MultivariateThresholds,
    pub oee: OeeSettings,
    pub pareto: ParetoSettings,
    pub trend: TrendThresholds,
}

/// Z-score bands for univariate severity assignment.
///
/// Bands are checked highest-first; the highest band met wins, which keeps
/// severity monotonic in z.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    pub low_sigma: f64,
    pub medium_sigma: f64,
    pub high_sigma: f64,
    pub critical_sigma: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            low_sigma: 2.0,
            medium_sigma: 2.5,
            high_sigma: 3.0,
            critical_sigma: 3.5,
        }
    }
}

/// Heuristic pattern-rule thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    /// Minimum ordered rows before any rule is evaluated
    pub min_rows: usize,
    /// Row-to-row OEE drop (absolute points) flagged as a sudden drop
    pub sudden_drop_points: f64,
    /// Minimum rows before the reject-trend rule is evaluated
    pub trend_min_rows: usize,
    /// Recent-vs-historical reject mean ratio that flags a rising trend
    pub trend_factor: f64,
    /// Rows in each of the recent/historical reject-mean windows
    pub trend_window: usize,
    /// Downtime exceeding this fraction of runtime breaches the threshold
    pub downtime_runtime_ratio: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            min_rows: 10,
            sudden_drop_points: 20.0,
            trend_min_rows: 20,
            trend_factor: 1.5,
            trend_window: 10,
            downtime_runtime_ratio: 0.3,
        }
    }
}

/// Mahalanobis-distance thresholds for the multivariate detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultivariateThresholds {
    /// Minimum qualifying rows before the analysis runs
    pub min_rows: usize,
    /// Chi-square 99th percentile at 5 degrees of freedom
    pub distance_threshold: f64,
    /// Distance above which the finding is HIGH rather than MEDIUM
    pub high_severity_distance: f64,
}

impl Default for MultivariateThresholds {
    fn default() -> Self {
        Self {
            min_rows: 30,
            distance_threshold: 15.09,
            high_severity_distance: 20.0,
        }
    }
}

/// OEE calculation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OeeSettings {
    /// Ideal cycle time assumed when an asset has none cached (minutes/unit)
    pub default_ideal_cycle_time: f64,
    /// TTL for cached per-asset ideal cycle times, seconds
    pub cycle_time_ttl_secs: u64,
}

impl Default for OeeSettings {
    fn default() -> Self {
        Self {
            default_ideal_cycle_time: 1.0,
            cycle_time_ttl_secs: 3600,
        }
    }
}

/// Pareto loss-analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParetoSettings {
    /// Cumulative-percentage cutoff defining the vital few (80/20 rule)
    pub vital_few_cutoff: f64,
    /// Vital-few entries considered for recommendations
    pub max_recommendations: usize,
}

impl Default for ParetoSettings {
    fn default() -> Self {
        Self {
            vital_few_cutoff: 80.0,
            max_recommendations: 5,
        }
    }
}

/// Trend fit and classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Minimum distinct days of history before a trend is fitted
    pub min_days: usize,
    /// Slope above which the trend is IMPROVING (points/day)
    pub improving_slope: f64,
    /// Slope below which the trend is DECLINING (points/day)
    pub declining_slope: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            min_days: 7,
            improving_slope: 0.1,
            declining_slope: -0.1,
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration using the documented lookup order.
    ///
    /// A missing file falls back to defaults; a file that exists but fails
    /// to parse also falls back, with a warning, so a bad edit cannot take
    /// the analytics service down.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if let Some(config) = Self::try_load_file(Path::new(&path)) {
                return config;
            }
            warn!(path = %path, "config file from {CONFIG_ENV_VAR} not usable, trying defaults");
        }

        if let Some(config) = Self::try_load_file(Path::new(DEFAULT_CONFIG_FILE)) {
            return config;
        }

        debug!("no analytics.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from an explicit path, falling back to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        Self::try_load_file(path).unwrap_or_else(|| {
            warn!(path = %path.display(), "config not usable, using built-in defaults");
            Self::default()
        })
    }

    fn try_load_file(path: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&raw) {
            Ok(config) => {
                info!(path = %path.display(), "analytics config loaded");
                Some(config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse analytics config");
                None
            }
        }
    }
}
