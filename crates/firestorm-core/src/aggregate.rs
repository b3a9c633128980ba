//! Dense per-interval rate tables.
//!
//! A [`RateTable`] has one row per interval between midnight of the first
//! record's calendar day and midnight after the last record's day, in a civil
//! [`Zone`]. Intervals start on the wall-clock hour (every hour, or at 00, 06,
//! 12 and 18 o'clock), so a daylight-saving day has 23 or 25 hourly rows.
//! Intervals without records are present with a count of zero and all rates
//! zero; the index is never built from observed timestamps alone.
//!
//! Each tracked rate is the share of an interval's records that carry one
//! category value. An interval with no records has rate zero, so there is
//! never a division by zero.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use firestorm_common::{Category, Error, Record, Result, Zone};
use firestorm_config::TrackedRateSpec;
use firestorm_math::Timeseries;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Interval width of a rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Hour,
    /// Four slots per day starting at 00, 06, 12 and 18 o'clock.
    SixHourSlot,
}

impl Granularity {
    pub fn hours(&self) -> i64 {
        match self {
            Granularity::Hour => 1,
            Granularity::SixHourSlot => 6,
        }
    }

    pub fn width(&self) -> Duration {
        Duration::hours(self.hours())
    }

    pub fn intervals_per_day(&self) -> usize {
        match self {
            Granularity::Hour => 24,
            Granularity::SixHourSlot => 4,
        }
    }

    /// Key of the interval column in exported rows.
    pub fn column_name(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::SixHourSlot => "six_hour_slot",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A named rate column resolved against the record schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRate {
    pub name: String,
    pub category: Category,
}

impl TrackedRate {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        TrackedRate {
            name: name.into(),
            category,
        }
    }

    /// Resolve a configured `(name, column, value)` triple.
    pub fn resolve(spec: &TrackedRateSpec) -> Result<Self> {
        Ok(TrackedRate {
            name: spec.name.clone(),
            category: Category::parse(&spec.column, &spec.value)?,
        })
    }

    pub fn resolve_all(specs: &[TrackedRateSpec]) -> Result<Vec<Self>> {
        specs.iter().map(TrackedRate::resolve).collect()
    }

    /// The standard set of rate columns.
    pub fn defaults() -> Result<Vec<Self>> {
        Self::resolve_all(&firestorm_config::AggregationConfig::default().tracked_rates)
    }
}

/// One interval of a [`RateTable`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    /// Interval start (inclusive).
    pub start: DateTime<FixedOffset>,
    pub total_count: u64,
    /// `total_count / max(total_count)`.
    pub total_count_normalized: f64,
    /// One value per tracked rate, in table column order.
    pub rates: Vec<f64>,
}

/// Dense, time-ordered interval table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    granularity: Granularity,
    rate_names: Vec<String>,
    rows: Vec<RateRow>,
    /// End of the last interval (exclusive).
    #[serde(default)]
    end: Option<DateTime<FixedOffset>>,
}

/// Count records per interval and compute tracked category shares.
///
/// Days are taken in the fixed offset of the first record. Fails with
/// [`Error::EmptyInput`] when `records` is empty.
pub fn aggregate(
    records: &[Record],
    granularity: Granularity,
    tracked: &[TrackedRate],
) -> Result<RateTable> {
    let zone = match records.first() {
        Some(first) => Zone::Fixed(*first.created_at.offset()),
        None => Zone::default(),
    };
    aggregate_in(records, granularity, tracked, &zone)
}

/// [`aggregate`] with days and interval boundaries taken in `zone`.
pub fn aggregate_in(
    records: &[Record],
    granularity: Granularity,
    tracked: &[TrackedRate],
    zone: &Zone,
) -> Result<RateTable> {
    if records.is_empty() {
        return Err(Error::EmptyInput(format!(
            "cannot build a {} rate table from zero records",
            granularity
        )));
    }
    Ok(build_table(records, granularity, tracked, zone))
}

/// Table construction for a non-empty collection.
pub(crate) fn build_table(
    records: &[Record],
    granularity: Granularity,
    tracked: &[TrackedRate],
    zone: &Zone,
) -> RateTable {
    let rate_names: Vec<String> = tracked.iter().map(|t| t.name.clone()).collect();
    let Some(first) = records.first() else {
        return RateTable {
            granularity,
            rate_names,
            rows: Vec::new(),
            end: None,
        };
    };

    let (mut earliest, mut latest) = (first.created_at, first.created_at);
    for r in records {
        earliest = earliest.min(r.created_at);
        latest = latest.max(r.created_at);
    }
    let first_day = zone.localize(&earliest).date_naive();
    let last_day = zone.localize(&latest).date_naive();

    let mut bounds = interval_bounds(zone, first_day, last_day, granularity);
    if bounds.len() < 2 {
        // dates at the edge of the calendar; fall back to constant offsets
        let fixed = Zone::Fixed(zone.offset_at(&earliest));
        bounds = interval_bounds(&fixed, first_day, last_day, granularity);
    }
    let n = bounds.len().saturating_sub(1);
    if n == 0 {
        return RateTable {
            granularity,
            rate_names,
            rows: Vec::new(),
            end: None,
        };
    }

    let mut totals = vec![0u64; n];
    let mut hits = vec![vec![0u64; tracked.len()]; n];
    for r in records {
        let idx = bounds
            .partition_point(|b| *b <= r.created_at)
            .saturating_sub(1)
            .min(n - 1);
        totals[idx] += 1;
        for (j, t) in tracked.iter().enumerate() {
            if t.category.matches(r) {
                hits[idx][j] += 1;
            }
        }
    }

    let normalized = Timeseries::from_counts(&totals)
        .normalized()
        .map(|ts| ts.values().to_vec())
        .unwrap_or_else(|_| vec![0.0; n]);
    let rows: Vec<RateRow> = totals
        .iter()
        .zip(hits)
        .zip(normalized)
        .zip(&bounds)
        .map(|(((&total, hits), normalized), &start)| RateRow {
            start,
            total_count: total,
            total_count_normalized: normalized,
            rates: hits
                .into_iter()
                .map(|h| if total > 0 { h as f64 / total as f64 } else { 0.0 })
                .collect(),
        })
        .collect();

    debug!(
        granularity = %granularity,
        zone = %zone,
        records = records.len(),
        intervals = rows.len(),
        days = (last_day - first_day).num_days() + 1,
        max_count = totals.iter().copied().max().unwrap_or(0),
        "rate table built"
    );

    RateTable {
        granularity,
        rate_names,
        rows,
        end: bounds.last().copied(),
    }
}

/// Interval starts from `first_day` through `last_day`, followed by the
/// first instant of the day after.
///
/// Wall-clock slot times skipped by a daylight-saving jump are dropped and
/// repeated ones appear twice.
fn interval_bounds(
    zone: &Zone,
    first_day: NaiveDate,
    last_day: NaiveDate,
    granularity: Granularity,
) -> Vec<DateTime<FixedOffset>> {
    let mut bounds = Vec::new();
    let mut day = first_day;
    while day <= last_day {
        for slot in 0..granularity.intervals_per_day() {
            let hour = (slot as i64 * granularity.hours()) as u32;
            if let Some(local) = day.and_hms_opt(hour, 0, 0) {
                bounds.extend(zone.instants_at(local));
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => return bounds,
        }
    }
    match zone.start_of_day(day) {
        Some(end) => bounds.push(end),
        None => return Vec::new(),
    }
    bounds.sort();
    bounds.dedup();
    bounds
}

impl RateTable {
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rate_names(&self) -> &[String] {
        &self.rate_names
    }

    /// Start of the first interval.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.rows.first().map(|r| r.start)
    }

    /// End of the last interval (exclusive).
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }

    /// End of row `i` (exclusive): the next row's start, or the table end.
    pub fn row_end(&self, i: usize) -> Option<DateTime<FixedOffset>> {
        match self.rows.get(i + 1) {
            Some(next) => Some(next.start),
            None if i + 1 == self.rows.len() => self.end,
            None => None,
        }
    }

    pub fn max_count(&self) -> u64 {
        self.rows.iter().map(|r| r.total_count).max().unwrap_or(0)
    }

    /// Per-interval values of a rate column.
    ///
    /// Besides the tracked rate names, `total_count` and
    /// `total_count_normalized` are accepted.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "total_count" => return Ok(self.rows.iter().map(|r| r.total_count as f64).collect()),
            "total_count_normalized" => {
                return Ok(self.rows.iter().map(|r| r.total_count_normalized).collect())
            }
            _ => {}
        }
        let j = self.rate_index(name)?;
        Ok(self.rows.iter().map(|r| r.rates[j]).collect())
    }

    /// Stack rate columns into an `n × names.len()` matrix, one row per
    /// interval.
    pub fn signal<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Vec<f64>>> {
        let columns = names
            .iter()
            .map(|n| self.column(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.rows.len())
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect())
    }

    pub fn total_counts(&self) -> Timeseries {
        let counts: Vec<u64> = self.rows.iter().map(|r| r.total_count).collect();
        Timeseries::from_counts(&counts)
    }

    /// Interval counts with the daily cycle averaged out.
    ///
    /// Needs at least two days of intervals; the first and last half day
    /// are dropped.
    pub fn count_trend(&self) -> Result<Timeseries> {
        self.total_counts()
            .trend(self.granularity.intervals_per_day())
    }

    /// Rows as flat JSON objects:
    /// `{hour|six_hour_slot, total_tweets, total_tweets_pct, <rates>...}`.
    pub fn export_rows(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                obj.insert(
                    self.granularity.column_name().to_string(),
                    Value::String(row.start.to_rfc3339()),
                );
                obj.insert("total_tweets".to_string(), Value::from(row.total_count));
                obj.insert(
                    "total_tweets_pct".to_string(),
                    Value::from(row.total_count_normalized),
                );
                for (name, rate) in self.rate_names.iter().zip(&row.rates) {
                    obj.insert(name.clone(), Value::from(*rate));
                }
                obj
            })
            .collect()
    }

    fn rate_index(&self, name: &str) -> Result<usize> {
        self.rate_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }
}
