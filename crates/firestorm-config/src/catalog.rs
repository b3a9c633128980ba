//! Firestorm catalog: one descriptor per collected query.
//!
//! Catalog files are JSON objects keyed by firestorm name:
//!
//! ```json
//! {
//!   "example_storm": {
//!     "query": "#examplestorm -is:retweet",
//!     "data_start_date": "2021-04-10",
//!     "data_end_date": "2021-04-20",
//!     "true_start_date": "2021-04-13",
//!     "true_end_date": "2021-04-15"
//!   }
//! }
//! ```
//!
//! Dates are whole days. A start date means the first instant of that day
//! and an end date means the first instant of the following day, both in the
//! engine's civil zone.

use chrono::{DateTime, FixedOffset, NaiveDate};
use firestorm_common::Zone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Collection parameters and the manually chosen analysis window of one
/// firestorm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestormDescriptor {
    pub query: String,
    pub data_start_date: NaiveDate,
    pub data_end_date: NaiveDate,
    #[serde(default)]
    pub true_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub true_end_date: Option<NaiveDate>,
}

impl FirestormDescriptor {
    /// Inclusive lower bound of the analysis window.
    pub fn true_start(&self, zone: &Zone) -> Option<DateTime<FixedOffset>> {
        self.true_start_date.and_then(|d| zone.start_of_day(d))
    }

    /// Exclusive upper bound of the analysis window.
    pub fn true_end(&self, zone: &Zone) -> Option<DateTime<FixedOffset>> {
        self.true_end_date
            .and_then(|d| d.succ_opt())
            .and_then(|d| zone.start_of_day(d))
    }

    /// Collection window as `[start, end)`.
    pub fn data_range(
        &self,
        zone: &Zone,
    ) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let start = zone.start_of_day(self.data_start_date)?;
        let end = zone.start_of_day(self.data_end_date.succ_opt()?)?;
        Some((start, end))
    }
}

/// Named firestorm descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, FirestormDescriptor>,
}

impl Catalog {
    /// Load a catalog from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::parse_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            entries = catalog.len(),
            "loaded firestorm catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog from a JSON string.
    pub fn parse_json(json: &str) -> ValidationResult<Self> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn get(&self, key: &str) -> ValidationResult<&FirestormDescriptor> {
        self.entries
            .get(key)
            .ok_or_else(|| ValidationError::UnknownFirestorm(key.to_string()))
    }

    pub fn insert(&mut self, key: impl Into<String>, descriptor: FirestormDescriptor) {
        self.entries.insert(key.into(), descriptor);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> ValidationResult<()> {
        for (key, d) in &self.entries {
            if d.data_end_date < d.data_start_date {
                return Err(ValidationError::SemanticError(format!(
                    "{}: data_end_date {} precedes data_start_date {}",
                    key, d.data_end_date, d.data_start_date
                )));
            }
            if let (Some(start), Some(end)) = (d.true_start_date, d.true_end_date) {
                if end < start {
                    return Err(ValidationError::SemanticError(format!(
                        "{}: true_end_date {} precedes true_start_date {}",
                        key, end, start
                    )));
                }
            }
        }
        Ok(())
    }
}
