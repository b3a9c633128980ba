//! Configuration snapshots for reproducible runs.
//!
//! A snapshot captures the exact configuration state at the start of a run,
//! so rate tables and phase boundaries can be traced back to their settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::EngineConfig;
use crate::resolve::ConfigPaths;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the config file content.
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Path the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Effective zone, e.g. `Europe/Berlin` or `+01:00`.
    pub timezone: String,
    pub tracked_rates: Vec<String>,
    pub min_threshold: f64,
    pub factor: f64,
    pub penalty: f64,
    pub analysis_columns: Vec<String>,
    pub language: Option<String>,
}

impl ConfigSnapshot {
    /// Create a snapshot from loaded configuration.
    pub fn new(config: &EngineConfig, paths: &ConfigPaths, raw_json: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_hash: raw_json.map(hash_content),
            config_path: paths.engine.as_ref().map(|p| p.display().to_string()),
            config_source: paths.engine_source.to_string(),
            summary: build_summary(config),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        Self::new(&EngineConfig::default(), &ConfigPaths::default(), None)
    }

    /// Whether two snapshots were taken with identical config content.
    pub fn same_config(&self, other: &ConfigSnapshot) -> bool {
        self.config_hash == other.config_hash && self.summary == other.summary
    }
}

fn build_summary(config: &EngineConfig) -> ConfigSummary {
    ConfigSummary {
        timezone: config
            .zone()
            .map(|zone| zone.to_string())
            .unwrap_or_else(|_| config.timezone.clone()),
        tracked_rates: config
            .aggregation
            .tracked_rates
            .iter()
            .map(|r| r.name.clone())
            .collect(),
        min_threshold: config.window.min_threshold,
        factor: config.window.factor,
        penalty: config.segmentation.penalty,
        analysis_columns: config.segmentation.analysis_columns.clone(),
        language: config.filters.language.clone(),
    }
}

/// Compute SHA-256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        let hash3 = hash_content("different");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_defaults_only() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.config_source, "builtin default");
        assert!(snapshot.config_hash.is_none());
        assert_eq!(snapshot.summary.penalty, 3.0);
        assert_eq!(snapshot.summary.tracked_rates.len(), 11);
        assert_eq!(snapshot.summary.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ConfigSnapshot = serde_json::from_str(&json).unwrap();
        assert!(snapshot.same_config(&back));
    }
}
