//! Minimal value series with an implicit `0..n` index.
//!
//! Used for the hourly count curve (window detection, normalization for
//! cross-firestorm comparison) and for trend extraction before correlating
//! firestorms with each other.

use firestorm_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default seasonal period for hourly data (one day).
pub const DAILY_PERIOD: usize = 24;

/// Ordered y-values; x is the position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeseries {
    y: Vec<f64>,
}

impl Timeseries {
    pub fn new(y: Vec<f64>) -> Self {
        Timeseries { y }
    }

    pub fn from_counts(counts: &[u64]) -> Self {
        Timeseries {
            y: counts.iter().map(|c| *c as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// Implicit x-axis.
    pub fn index(&self) -> impl Iterator<Item = usize> {
        0..self.y.len()
    }

    /// Largest value, `None` for an empty series.
    pub fn max(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::max)
    }

    /// Scale so the maximum becomes 1.
    ///
    /// Fails with [`Error::EmptyInput`] when there is nothing to scale
    /// against (empty series or non-positive maximum).
    pub fn normalized(&self) -> Result<Timeseries> {
        let max = match self.max() {
            Some(m) if m > 0.0 => m,
            Some(_) => {
                return Err(Error::EmptyInput(
                    "cannot normalize a series without a positive maximum".into(),
                ))
            }
            None => return Err(Error::EmptyInput("cannot normalize an empty series".into())),
        };
        Ok(Timeseries {
            y: self.y.iter().map(|v| v / max).collect(),
        })
    }

    /// Additive seasonal decomposition `y = trend + seasonal + resid`.
    ///
    /// The trend is a centered moving average over one period (a 2×p
    /// average for even periods), undefined for the first and last half
    /// period. Seasonal components are the per-phase means of the detrended
    /// series, shifted to sum to zero over one period.
    pub fn decompose(&self, period: usize) -> Result<Decomposition> {
        if period < 2 {
            return Err(Error::Config(format!(
                "decomposition period must be >= 2, got {}",
                period
            )));
        }
        let n = self.y.len();
        if n < 2 * period {
            return Err(Error::insufficient("seasonal decomposition", 2 * period, n));
        }

        let trend = centered_moving_average(&self.y, period);

        let mut phase_sums = vec![0.0; period];
        let mut phase_counts = vec![0usize; period];
        for (i, (y, t)) in self.y.iter().zip(&trend).enumerate() {
            if let Some(t) = t {
                phase_sums[i % period] += y - t;
                phase_counts[i % period] += 1;
            }
        }
        let mut phase_means: Vec<f64> = phase_sums
            .iter()
            .zip(&phase_counts)
            .map(|(s, c)| if *c > 0 { s / *c as f64 } else { 0.0 })
            .collect();
        let center = phase_means.iter().sum::<f64>() / period as f64;
        for m in &mut phase_means {
            *m -= center;
        }

        let seasonal: Vec<f64> = (0..n).map(|i| phase_means[i % period]).collect();
        let resid = self
            .y
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((y, t), s)| t.map(|t| y - t - s))
            .collect();

        Ok(Decomposition {
            period,
            trend,
            seasonal,
            resid,
        })
    }

    /// Trend component with the undefined edges dropped.
    pub fn trend(&self, period: usize) -> Result<Timeseries> {
        let decomposition = self.decompose(period)?;
        Ok(Timeseries {
            y: decomposition.trend.into_iter().flatten().collect(),
        })
    }
}

impl From<Vec<f64>> for Timeseries {
    fn from(y: Vec<f64>) -> Self {
        Timeseries::new(y)
    }
}

impl std::fmt::Display for Timeseries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.y)
    }
}

/// Result of [`Timeseries::decompose`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub period: usize,
    /// `None` where the moving-average window leaves the series.
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub resid: Vec<Option<f64>>,
}

fn centered_moving_average(y: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;
    let n = y.len();

    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let start = i - half;
            Some(
                weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * y[start + k])
                    .sum(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn normalized_scales_max_to_one() {
        let ts = Timeseries::new(vec![2.0, 4.0, 1.0]);
        let n = ts.normalized().unwrap();
        assert_eq!(n.values(), &[0.5, 1.0, 0.25]);
        // original untouched
        assert_eq!(ts.values(), &[2.0, 4.0, 1.0]);
    }

    #[test]
    fn normalized_rejects_empty_and_all_zero() {
        assert!(matches!(
            Timeseries::default().normalized(),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            Timeseries::new(vec![0.0; 5]).normalized(),
            Err(Error::EmptyInput(_))
        ));
    }

    #[test]
    fn index_is_implicit() {
        let ts = Timeseries::from_counts(&[3, 1, 4]);
        assert_eq!(ts.index().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(ts.to_string(), "[3.0, 1.0, 4.0]");
    }

    #[test]
    fn decompose_recovers_linear_trend_and_daily_cycle() {
        // y = 0.5 * t + 10 * [t % 24 < 12]
        let y: Vec<f64> = (0..96)
            .map(|t| 0.5 * t as f64 + if t % 24 < 12 { 10.0 } else { 0.0 })
            .collect();
        let d = Timeseries::new(y.clone()).decompose(DAILY_PERIOD).unwrap();

        assert!(d.trend[..12].iter().all(Option::is_none));
        assert!(d.trend[84..].iter().all(Option::is_none));
        // trend of a centered 2x24 average over a linear + periodic signal
        // is the linear part plus the cycle mean (5.0)
        for t in 12..84 {
            let trend = d.trend[t].unwrap();
            assert!(approx_eq(trend, 0.5 * t as f64 + 5.0, 1e-9), "t={t} trend={trend}");
        }
        // seasonal swings +-5 around zero and sums to zero over a period
        let seasonal_sum: f64 = d.seasonal[..24].iter().sum();
        assert!(approx_eq(seasonal_sum, 0.0, 1e-9));
        assert!(approx_eq(d.seasonal[30], 5.0, 1e-9));
        assert!(approx_eq(d.seasonal[40], -5.0, 1e-9));
        for t in 12..84 {
            assert!(approx_eq(d.resid[t].unwrap(), 0.0, 1e-9));
        }
    }

    #[test]
    fn decompose_needs_two_periods() {
        let ts = Timeseries::new(vec![1.0; 47]);
        assert!(matches!(
            ts.decompose(DAILY_PERIOD),
            Err(Error::InsufficientData { required: 48, actual: 47, .. })
        ));
        assert!(ts.decompose(1).is_err());
    }

    #[test]
    fn odd_period_uses_plain_average() {
        let ts = Timeseries::new((0..9).map(|v| v as f64).collect());
        let trend = ts.trend(3).unwrap();
        assert_eq!(trend.len(), 7);
        assert!(approx_eq(trend.values()[0], 1.0, 1e-12));
    }
}
