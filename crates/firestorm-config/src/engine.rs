//! Engine configuration types.
//!
//! Every section has serde defaults, so `{}` is a complete configuration and
//! a file only needs to name what it changes.

use firestorm_common::Zone;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// IANA zone all timestamps are normalized to.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Fixed offset in minutes east of UTC; overrides `timezone` when set.
    #[serde(default)]
    pub timezone_offset_minutes: Option<i32>,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub segmentation: SegmentationConfig,

    #[serde(default)]
    pub filters: FilterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: default_schema_version(),
            timezone: default_timezone(),
            timezone_offset_minutes: None,
            aggregation: AggregationConfig::default(),
            window: WindowConfig::default(),
            segmentation: SegmentationConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// The configured civil zone: the fixed offset if one is set, the named
    /// zone otherwise.
    pub fn zone(&self) -> ValidationResult<Zone> {
        match self.timezone_offset_minutes {
            Some(minutes) => {
                Zone::fixed_minutes(minutes).map_err(|_| ValidationError::InvalidValue {
                    field: "timezone_offset_minutes".to_string(),
                    message: format!("Must be within ±1439 minutes, got {}", minutes),
                })
            }
            None => Zone::named(&self.timezone).map_err(|_| ValidationError::InvalidValue {
                field: "timezone".to_string(),
                message: format!("Unknown IANA time zone '{}'", self.timezone),
            }),
        }
    }
}

/// Rate-table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_tracked_rates")]
    pub tracked_rates: Vec<TrackedRateSpec>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            tracked_rates: default_tracked_rates(),
        }
    }
}

/// One tracked rate: output column `name` is the share of posts whose
/// `column` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRateSpec {
    pub name: String,
    pub column: String,
    pub value: String,
}

impl TrackedRateSpec {
    pub fn new(name: &str, column: &str, value: &str) -> Self {
        TrackedRateSpec {
            name: name.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Activity window thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Absolute floor on the per-interval count that counts as active.
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f64,

    /// Fraction of the peak count that counts as active.
    #[serde(default = "default_factor")]
    pub factor: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            min_threshold: default_min_threshold(),
            factor: default_factor(),
        }
    }
}

/// Change-point segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default = "default_penalty")]
    pub penalty: f64,

    #[serde(default = "default_min_size")]
    pub min_size: usize,

    #[serde(default = "default_jump")]
    pub jump: usize,

    /// Fixed RBF bandwidth; median heuristic when absent.
    #[serde(default)]
    pub gamma: Option<f64>,

    /// Rate columns stacked into the segmentation signal.
    #[serde(default = "default_analysis_columns")]
    pub analysis_columns: Vec<String>,

    /// Largest table that is segmented. The kernel cost is quadratic in
    /// memory, about 16 bytes per pair of intervals.
    #[serde(default = "default_max_intervals")]
    pub max_intervals: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        SegmentationConfig {
            penalty: default_penalty(),
            min_size: default_min_size(),
            jump: default_jump(),
            gamma: None,
            analysis_columns: default_analysis_columns(),
            max_intervals: default_max_intervals(),
        }
    }
}

/// Default filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Language kept by the default chain; `None` skips the language stage.
    #[serde(default = "default_language")]
    pub language: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            language: default_language(),
        }
    }
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_timezone() -> String {
    firestorm_common::DEFAULT_ZONE.name().to_string()
}

fn default_tracked_rates() -> Vec<TrackedRateSpec> {
    vec![
        TrackedRateSpec::new("retweet_pct", "tweet_type", "retweet without comment"),
        TrackedRateSpec::new("original_tweet_pct", "tweet_type", "original tweet"),
        TrackedRateSpec::new("reply_pct", "tweet_type", "reply"),
        TrackedRateSpec::new("quoted_pct", "tweet_type", "retweet with comment"),
        TrackedRateSpec::new("laggards_pct", "user_type", "laggard"),
        TrackedRateSpec::new("active_pct", "user_type", "active"),
        TrackedRateSpec::new("hyper_active_pct", "user_type", "hyper-active"),
        TrackedRateSpec::new("de_pct", "lang", "de"),
        TrackedRateSpec::new("en_pct", "lang", "en"),
        TrackedRateSpec::new("offensive_pct", "is_offensive", "true"),
        TrackedRateSpec::new("not_offensive_pct", "is_offensive", "false"),
    ]
}

fn default_min_threshold() -> f64 {
    100.0
}

fn default_factor() -> f64 {
    0.2
}

fn default_penalty() -> f64 {
    3.0
}

fn default_min_size() -> usize {
    2
}

fn default_jump() -> usize {
    1
}

/// Twelve weeks of hourly rows, about 62 MiB of kernel cost.
fn default_max_intervals() -> usize {
    2016
}

fn default_analysis_columns() -> Vec<String> {
    [
        "retweet_pct",
        "original_tweet_pct",
        "reply_pct",
        "laggards_pct",
        "active_pct",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_language() -> Option<String> {
    Some("de".to_string())
}
