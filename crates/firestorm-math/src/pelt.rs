//! Pruned Exact Linear Time (PELT) change-point search.
//!
//! Finds the segmentation minimizing
//!
//! ```text
//! Σ_segments c(segment) + β · (#segments)
//! ```
//!
//! for a segment cost `c` and penalty `β`. The number of segments is not
//! fixed; it falls out of the penalty. Candidate split positions whose best
//! partial cost can no longer beat the current optimum are pruned, which keeps
//! the search near-linear for costs that are additive over splits.
//!
//! The result lists segment *ends*, strictly increasing, the last always
//! equal to the number of samples. Ties are broken towards the earliest
//! candidate so the output is deterministic.

use firestorm_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::kernel::SegmentCost;

/// PELT search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pelt {
    /// Penalty added per segment.
    pub penalty: f64,
    /// Minimum segment length in samples.
    pub min_size: usize,
    /// Only positions that are multiples of `jump` are considered as splits.
    pub jump: usize,
}

impl Default for Pelt {
    fn default() -> Self {
        Pelt {
            penalty: 3.0,
            min_size: 2,
            jump: 1,
        }
    }
}

impl Pelt {
    pub fn new(penalty: f64) -> Self {
        Pelt {
            penalty,
            ..Default::default()
        }
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_jump(mut self, jump: usize) -> Self {
        self.jump = jump;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.penalty.is_nan() || self.penalty < 0.0 {
            return Err(Error::Config(format!(
                "penalty must be >= 0, got {}",
                self.penalty
            )));
        }
        if self.min_size == 0 {
            return Err(Error::Config("min_size must be >= 1".into()));
        }
        if self.jump == 0 {
            return Err(Error::Config("jump must be >= 1".into()));
        }
        Ok(())
    }

    /// Segment ends for the optimal segmentation under `cost`.
    ///
    /// Returns an empty list for an empty signal and `[n]` whenever no split
    /// pays for its penalty (including an infinite penalty).
    pub fn predict<C: SegmentCost>(&self, cost: &C) -> Result<Vec<usize>> {
        self.validate()?;
        let n = cost.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        if self.penalty.is_infinite() || n < 2 * self.min_size {
            return Ok(vec![n]);
        }

        let mut candidates: Vec<usize> = (self.min_size..n)
            .filter(|t| t % self.jump == 0)
            .collect();
        candidates.push(n);

        // best[t]: optimal cost of [0, t); last[t]: start of its final segment
        let mut best = vec![f64::INFINITY; n + 1];
        let mut last = vec![0usize; n + 1];
        best[0] = -self.penalty;
        let mut admissible: Vec<usize> = vec![0];

        for &t in &candidates {
            let mut scored: Vec<(usize, Option<f64>)> = Vec::with_capacity(admissible.len());
            let mut best_t = f64::INFINITY;
            let mut arg_t = 0usize;

            for &s in &admissible {
                if t - s < self.min_size || !best[s].is_finite() {
                    scored.push((s, None));
                    continue;
                }
                let partial = best[s] + cost.error(s, t);
                if partial + self.penalty < best_t {
                    best_t = partial + self.penalty;
                    arg_t = s;
                }
                scored.push((s, Some(partial)));
            }

            best[t] = best_t;
            last[t] = arg_t;

            admissible = scored
                .into_iter()
                .filter(|(_, partial)| match partial {
                    Some(p) => *p <= best_t,
                    None => true,
                })
                .map(|(s, _)| s)
                .collect();
            admissible.push(t);
        }

        let mut ends = Vec::new();
        let mut t = n;
        while t > 0 {
            ends.push(t);
            t = last[t];
        }
        ends.reverse();
        Ok(ends)
    }
}
