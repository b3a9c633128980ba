//! Firestorm math utilities.

pub mod kernel;
pub mod pelt;
pub mod series;
pub mod stats;

pub use kernel::{RbfCost, SegmentCost};
pub use pelt::Pelt;
pub use series::{Decomposition, Timeseries, DAILY_PERIOD};
pub use stats::{fraction_to_pct, mean, median};
