//! Record filter chain with a per-stage length log.
//!
//! A [`FilterPipeline`] is an ordered list of [`Filter`] stages. Running it
//! applies each stage to the output of the previous one and records the
//! collection length before the first stage and after every stage, so the
//! resulting [`FilterLog`] always has `stages + 1` entries and never grows.
//!
//! Stages are pure: they never fail on a well-typed collection and return an
//! empty collection when nothing matches.

use chrono::{DateTime, FixedOffset};
use firestorm_common::{Category, Record, Zone};
use firestorm_config::FirestormDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One stage of a filter chain.
pub trait Filter: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Keep the records this stage accepts, preserving order.
    fn apply(&self, records: Vec<Record>) -> Vec<Record>;
}

/// Keeps records whose categorical attribute equals a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityFilter {
    category: Category,
}

impl EqualityFilter {
    pub fn new(category: Category) -> Self {
        EqualityFilter { category }
    }

    pub fn lang(lang: &str) -> Self {
        EqualityFilter::new(Category::Lang(lang.to_string()))
    }

    pub fn category(&self) -> &Category {
        &self.category
    }
}

impl Filter for EqualityFilter {
    fn describe(&self) -> String {
        format!("{} == {}", self.category.column(), self.category.value_label())
    }

    fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|r| self.category.matches(r))
            .collect()
    }
}

/// Ordered record attribute an [`IntervalFilter`] can range over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalAttribute {
    /// Compared as epoch milliseconds.
    CreatedAt,
    UserActivity,
    FirestormActivity,
}

impl IntervalAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalAttribute::CreatedAt => "created_at",
            IntervalAttribute::UserActivity => "user_activity",
            IntervalAttribute::FirestormActivity => "firestorm_activity",
        }
    }

    fn key(&self, record: &Record) -> Option<i64> {
        match self {
            IntervalAttribute::CreatedAt => Some(record.created_at.timestamp_millis()),
            IntervalAttribute::UserActivity => record.user_activity.map(saturating_i64),
            IntervalAttribute::FirestormActivity => record.firestorm_activity.map(saturating_i64),
        }
    }

    fn render(&self, key: i64) -> String {
        match self {
            IntervalAttribute::CreatedAt => DateTime::from_timestamp_millis(key)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| key.to_string()),
            _ => key.to_string(),
        }
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Keeps records with `lower <= attribute < upper`.
///
/// Both bounds are required. A missing bound empties the collection and
/// logs a warning; records whose attribute is null are always dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalFilter {
    attribute: IntervalAttribute,
    lower: Option<i64>,
    upper: Option<i64>,
}

impl IntervalFilter {
    pub fn created_at(
        lower: Option<DateTime<FixedOffset>>,
        upper: Option<DateTime<FixedOffset>>,
    ) -> Self {
        IntervalFilter {
            attribute: IntervalAttribute::CreatedAt,
            lower: lower.map(|t| t.timestamp_millis()),
            upper: upper.map(|t| t.timestamp_millis()),
        }
    }

    /// Range over one of the activity counts.
    pub fn activity(attribute: IntervalAttribute, lower: Option<u64>, upper: Option<u64>) -> Self {
        IntervalFilter {
            attribute,
            lower: lower.map(saturating_i64),
            upper: upper.map(saturating_i64),
        }
    }

    pub fn attribute(&self) -> IntervalAttribute {
        self.attribute
    }

    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}

impl Filter for IntervalFilter {
    fn describe(&self) -> String {
        let bound = |b: Option<i64>| match b {
            Some(v) => self.attribute.render(v),
            None => "None".to_string(),
        };
        format!(
            "{} in [{}, {})",
            self.attribute.as_str(),
            bound(self.lower),
            bound(self.upper)
        )
    }

    fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let (Some(lower), Some(upper)) = (self.lower, self.upper) else {
            warn!(
                attribute = self.attribute.as_str(),
                lower = ?self.lower,
                upper = ?self.upper,
                "interval filter is missing a bound; dropping all records"
            );
            return Vec::new();
        };
        records
            .into_iter()
            .filter(|r| {
                self.attribute
                    .key(r)
                    .is_some_and(|k| lower <= k && k < upper)
            })
            .collect()
    }
}

/// Collection length before the first stage and after each stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterLog(Vec<usize>);

impl FilterLog {
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn initial(&self) -> usize {
        self.0.first().copied().unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    /// Fraction of the initial records removed, `1 - last / first`.
    ///
    /// Zero when there was nothing to filter.
    pub fn pct_filtered(&self) -> f64 {
        match self.initial() {
            0 => 0.0,
            initial => 1.0 - self.remaining() as f64 / initial as f64,
        }
    }
}

/// Ordered filter stages.
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        FilterPipeline::default()
    }

    pub fn with(mut self, stage: impl Filter + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn push(&mut self, stage: Box<dyn Filter>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn describe(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.describe()).collect()
    }

    /// Apply every stage in order.
    pub fn run(&self, records: Vec<Record>) -> (Vec<Record>, FilterLog) {
        let mut log = Vec::with_capacity(self.stages.len() + 1);
        log.push(records.len());
        let mut current = records;
        for stage in &self.stages {
            current = stage.apply(current);
            debug!(stage = %stage.describe(), remaining = current.len(), "filter stage applied");
            log.push(current.len());
        }
        (current, FilterLog(log))
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}

/// Standard chain for a catalogued firestorm: the manually chosen window on
/// `created_at`, then the target language if one is configured.
pub fn default_filters(
    descriptor: &FirestormDescriptor,
    zone: &Zone,
    language: Option<&str>,
) -> FilterPipeline {
    let mut pipeline = FilterPipeline::new().with(IntervalFilter::created_at(
        descriptor.true_start(zone),
        descriptor.true_end(zone),
    ));
    if let Some(lang) = language {
        pipeline = pipeline.with(EqualityFilter::lang(lang));
    }
    pipeline
}
