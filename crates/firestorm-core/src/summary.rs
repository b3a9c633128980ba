//! Flat metadata summary of a filtered firestorm.
//!
//! The summary merges the catalog descriptor with figures about the
//! filtered collection:
//!
//! | key | meaning |
//! |-----|---------|
//! | `length` | records left after filtering |
//! | `filtering_lengths_log` | filter log |
//! | `pct_filtered` | share removed by filtering, in percent |
//! | `average_aggressiveness` | offensive share of labelled records in percent, or `null` |
//! | `aggr_value_counts` | counts of `true` / `false` / `null` offensiveness labels |
//!
//! Percentages are rounded to two decimals. Dates render as ISO-8601.

use chrono::{DateTime, FixedOffset};
use firestorm_common::{Record, Result, Zone};
use firestorm_config::FirestormDescriptor;
use firestorm_math::{fraction_to_pct, mean};
use serde_json::{Map, Value};

use crate::firestorm::Firestorm;

/// Offensiveness label counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggressionCounts {
    pub offensive: usize,
    pub not_offensive: usize,
    pub unlabelled: usize,
}

impl AggressionCounts {
    pub fn count(records: &[Record]) -> Self {
        let mut counts = AggressionCounts::default();
        for r in records {
            match r.is_offensive {
                Some(true) => counts.offensive += 1,
                Some(false) => counts.not_offensive += 1,
                None => counts.unlabelled += 1,
            }
        }
        counts
    }

    fn to_json(self) -> Value {
        let mut obj = Map::new();
        obj.insert("true".into(), Value::from(self.offensive));
        obj.insert("false".into(), Value::from(self.not_offensive));
        obj.insert("null".into(), Value::from(self.unlabelled));
        Value::Object(obj)
    }
}

/// Share of labelled records that are offensive, as a percentage.
///
/// `None` when no record carries a label.
pub fn average_aggressiveness(records: &[Record]) -> Option<f64> {
    let labels: Vec<f64> = records
        .iter()
        .filter_map(|r| r.is_offensive)
        .map(|flag| if flag { 1.0 } else { 0.0 })
        .collect();
    mean(&labels).map(fraction_to_pct)
}

/// Metadata map for `firestorm`, merged with `descriptor`.
pub fn summary(
    firestorm: &Firestorm,
    descriptor: &FirestormDescriptor,
    zone: &Zone,
) -> Result<Map<String, Value>> {
    let mut out = match serde_json::to_value(descriptor)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let iso = |t: Option<DateTime<FixedOffset>>| {
        t.map(|t| Value::String(t.to_rfc3339())).unwrap_or(Value::Null)
    };
    out.insert("true_start".into(), iso(descriptor.true_start(zone)));
    out.insert("true_end".into(), iso(descriptor.true_end(zone)));

    let records = firestorm.records();
    let log = firestorm.filter_log();
    out.insert("length".into(), Value::from(records.len()));
    out.insert(
        "filtering_lengths_log".into(),
        serde_json::to_value(log)?,
    );
    out.insert(
        "pct_filtered".into(),
        Value::from(fraction_to_pct(log.pct_filtered())),
    );
    out.insert(
        "average_aggressiveness".into(),
        average_aggressiveness(records)
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    out.insert(
        "aggr_value_counts".into(),
        AggressionCounts::count(records).to_json(),
    );
    Ok(out)
}
