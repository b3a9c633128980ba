//! Activity window detection.
//!
//! The activity threshold of a table is
//!
//! ```text
//! threshold = max(min_threshold, factor · max(total_count))
//! ```
//!
//! Intervals are grouped by calendar day. The window opens on the first day
//! whose busiest interval reaches the threshold and closes on the last day of
//! the unbroken run of such days (the last day of the table if the burst
//! never subsides). Within those days it is refined to intervals: it starts
//! at the first qualifying interval of the start day and ends one interval
//! past the last qualifying interval of the end day.

use chrono::{DateTime, FixedOffset, NaiveDate};
use firestorm_config::WindowConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::RateTable;
use crate::filter::IntervalFilter;

/// Thresholding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityWindowDetector {
    pub min_threshold: f64,
    pub factor: f64,
}

impl Default for ActivityWindowDetector {
    fn default() -> Self {
        WindowConfig::default().into()
    }
}

impl From<WindowConfig> for ActivityWindowDetector {
    fn from(config: WindowConfig) -> Self {
        ActivityWindowDetector {
            min_threshold: config.min_threshold,
            factor: config.factor,
        }
    }
}

impl ActivityWindowDetector {
    pub fn new(min_threshold: f64, factor: f64) -> Self {
        ActivityWindowDetector {
            min_threshold,
            factor,
        }
    }

    /// Copy with per-call overrides applied.
    pub fn with_overrides(self, min_threshold: Option<f64>, factor: Option<f64>) -> Self {
        ActivityWindowDetector {
            min_threshold: min_threshold.unwrap_or(self.min_threshold),
            factor: factor.unwrap_or(self.factor),
        }
    }

    pub fn threshold(&self, table: &RateTable) -> f64 {
        self.min_threshold
            .max(self.factor * table.max_count() as f64)
    }

    /// Locate the activity window of `table`.
    pub fn detect(&self, table: &RateTable) -> ActivityWindow {
        let threshold = self.threshold(table);
        let rows = table.rows();

        // (day, first row index, one past last row index)
        let mut days: Vec<(NaiveDate, usize, usize)> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let day = row.start.date_naive();
            match days.last_mut() {
                Some((d, _, end)) if *d == day => *end = i + 1,
                _ => days.push((day, i, i + 1)),
            }
        }
        let qualifies = |i: usize| rows[i].total_count as f64 >= threshold;
        let day_qualifies = |&(_, lo, hi): &(NaiveDate, usize, usize)| (lo..hi).any(qualifies);

        let Some(start_pos) = days.iter().position(day_qualifies) else {
            warn!(
                threshold,
                max_count = table.max_count(),
                "no interval reaches the activity threshold; window is empty"
            );
            return ActivityWindow::none(threshold);
        };
        let end_pos = days[start_pos..]
            .iter()
            .position(|d| !day_qualifies(d))
            .map(|offset| start_pos + offset - 1)
            .unwrap_or(days.len() - 1);

        let (start_day, lo, hi) = days[start_pos];
        let (end_day, end_lo, end_hi) = days[end_pos];
        let start_index = (lo..hi).find(|&i| qualifies(i));
        let end_index = (end_lo..end_hi).rev().find(|&i| qualifies(i)).map(|i| i + 1);

        let (Some(start_index), Some(end_index)) = (start_index, end_index) else {
            return ActivityWindow::none(threshold);
        };

        let window = ActivityWindow {
            start: Some(rows[start_index].start),
            end: table.row_end(end_index - 1),
            start_index: Some(start_index),
            end_index: Some(end_index),
            start_day: Some(start_day),
            end_day: Some(end_day),
            threshold,
        };
        debug!(
            threshold,
            start = ?window.start,
            end = ?window.end,
            "activity window detected"
        );
        window
    }
}

/// Detected window, `[start, end)`. Both bounds are `None` when no day
/// reaches the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    /// Row index of `start` in the detected table.
    pub start_index: Option<usize>,
    /// Row index one past the last active interval.
    pub end_index: Option<usize>,
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
    pub threshold: f64,
}

impl ActivityWindow {
    fn none(threshold: f64) -> Self {
        ActivityWindow {
            start: None,
            end: None,
            start_index: None,
            end_index: None,
            start_day: None,
            end_day: None,
            threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }

    pub fn bounds(&self) -> (Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>) {
        (self.start, self.end)
    }

    /// A `created_at` filter for this window; an empty window filters
    /// everything out.
    pub fn to_filter(&self) -> IntervalFilter {
        IntervalFilter::created_at(self.start, self.end)
    }
}
