//! Phase segmentation of a firestorm.
//!
//! Selected rate columns of a table are stacked into an `n × d` signal and
//! segmented with PELT under an RBF-kernel cost. PELT always reports the end
//! of the data as the last boundary; it carries no information and is
//! dropped, so a homogeneous firestorm has no breakpoints at all.
//!
//! Breakpoints are then used to slice the time-ordered records into phases
//! that cover `[min(created_at), max(created_at)]` without gaps or overlap.

use chrono::{DateTime, FixedOffset};
use firestorm_common::{Error, Record, Result};
use firestorm_config::SegmentationConfig;
use firestorm_math::{Pelt, RbfCost};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::RateTable;

/// Change-point search configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSegmenter {
    pelt: Pelt,
    gamma: Option<f64>,
    analysis_columns: Vec<String>,
    max_intervals: usize,
}

impl Default for PhaseSegmenter {
    fn default() -> Self {
        PhaseSegmenter::from_config(&SegmentationConfig::default())
    }
}

impl PhaseSegmenter {
    pub fn from_config(config: &SegmentationConfig) -> Self {
        PhaseSegmenter {
            pelt: Pelt::new(config.penalty)
                .with_min_size(config.min_size)
                .with_jump(config.jump),
            gamma: config.gamma,
            analysis_columns: config.analysis_columns.clone(),
            max_intervals: config.max_intervals,
        }
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.pelt.penalty = penalty;
        self
    }

    pub fn with_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.analysis_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gamma(mut self, gamma: Option<f64>) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_max_intervals(mut self, max_intervals: usize) -> Self {
        self.max_intervals = max_intervals;
        self
    }

    pub fn penalty(&self) -> f64 {
        self.pelt.penalty
    }

    pub fn analysis_columns(&self) -> &[String] {
        &self.analysis_columns
    }

    /// Internal change points of `table`, strictly increasing.
    ///
    /// A breakpoint names the first interval of the new segment: `index` is
    /// the row where the segment starts and `at` is that row's start, so
    /// `rows[index - 1]` is the last interval of the old segment. Labelling
    /// by the last interval of the old segment instead would put every
    /// boundary one interval earlier.
    ///
    /// Fails with [`Error::InsufficientData`] for fewer than two intervals,
    /// [`Error::UnknownColumn`] for an analysis column the table does not
    /// track and [`Error::Config`] for tables longer than the configured
    /// `max_intervals`, whose kernel cost would not fit in memory.
    pub fn breakpoints(&self, table: &RateTable) -> Result<Vec<Breakpoint>> {
        let n = table.len();
        if n < 2 {
            return Err(Error::insufficient("segmentation", 2, n));
        }
        if n > self.max_intervals {
            return Err(Error::Config(format!(
                "segmentation of {} intervals exceeds max_intervals {} (kernel cost needs {} MiB)",
                n,
                self.max_intervals,
                RbfCost::fit_bytes(n) >> 20
            )));
        }
        let signal = table.signal(&self.analysis_columns)?;
        let cost = RbfCost::fit(&signal, self.gamma)?;
        let mut ends = self.pelt.predict(&cost)?;
        // last end is always n
        ends.pop();

        let rows = table.rows();
        let breakpoints: Vec<Breakpoint> = ends
            .into_iter()
            .filter_map(|index| {
                rows.get(index).map(|row| Breakpoint {
                    index,
                    at: row.start,
                })
            })
            .collect();

        debug!(
            intervals = n,
            columns = self.analysis_columns.len(),
            penalty = self.pelt.penalty,
            gamma = cost.gamma(),
            breakpoints = breakpoints.len(),
            "segmentation finished"
        );
        Ok(breakpoints)
    }
}

/// Start of a new segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Row index of the first interval of the new segment.
    pub index: usize,
    /// Start of that interval.
    pub at: DateTime<FixedOffset>,
}

/// A contiguous sub-range of a firestorm and the records inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub index: usize,
    pub start: DateTime<FixedOffset>,
    /// Exclusive, except for the last phase which ends at the latest record.
    pub end: DateTime<FixedOffset>,
    pub records: Vec<Record>,
}

impl Phase {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> PhaseSummary {
        PhaseSummary {
            index: self.index,
            start: self.start,
            end: self.end,
            count: self.records.len(),
        }
    }
}

/// [`Phase`] without its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub index: usize,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub count: usize,
}

/// Slice `records` into phases at `breakpoints`.
///
/// Boundaries are `min(created_at)`, every breakpoint strictly inside
/// `(min, max)`, and `max(created_at)`. Phase `i` holds the records in
/// `[b_i, b_{i+1})`; the last phase is closed so the latest record is kept.
pub fn segment(records: &[Record], breakpoints: &[DateTime<FixedOffset>]) -> Result<Vec<Phase>> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.created_at);
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Err(Error::EmptyInput("cannot segment zero records".into()));
    };
    let (global_min, global_max) = (first.created_at, last.created_at);

    let mut boundaries = vec![global_min];
    let mut inner: Vec<DateTime<FixedOffset>> = breakpoints
        .iter()
        .copied()
        .filter(|b| global_min < *b && *b < global_max)
        .collect();
    inner.sort();
    inner.dedup();
    boundaries.extend(inner);
    boundaries.push(global_max);

    let phase_count = boundaries.len() - 1;
    let mut phases = Vec::with_capacity(phase_count);
    let mut rest = sorted.into_iter().peekable();
    for (i, pair) in boundaries.windows(2).enumerate() {
        let (start, end) = (pair[0], pair[1]);
        let is_last = i + 1 == phase_count;
        let mut members = Vec::new();
        while let Some(r) = rest.next_if(|r| r.created_at < end || is_last) {
            members.push(r);
        }
        phases.push(Phase {
            index: i,
            start,
            end,
            records: members,
        });
    }
    Ok(phases)
}

/// Convenience: breakpoints of `table` applied to `records`.
pub fn phases(
    segmenter: &PhaseSegmenter,
    table: &RateTable,
    records: &[Record],
) -> Result<Vec<Phase>> {
    let at: Vec<DateTime<FixedOffset>> = segmenter
        .breakpoints(table)?
        .into_iter()
        .map(|b| b.at)
        .collect();
    segment(records, &at)
}
