//! Firestorm Time-Series Engine
//!
//! Turns a collection of timestamped, categorised posts into:
//! - a filtered collection with a per-stage length log ([`filter`])
//! - dense hourly / six-hourly rate tables ([`aggregate`])
//! - the activity window of the burst ([`window`])
//! - change-point phases ([`segment`])
//! - a flat metadata summary ([`summary`])
//!
//! The binary entry point is in `main.rs`.

pub mod aggregate;
pub mod exit_codes;
pub mod filter;
pub mod firestorm;
pub mod logging;
pub mod segment;
pub mod summary;
pub mod window;

pub use aggregate::{aggregate, aggregate_in, Granularity, RateRow, RateTable, TrackedRate};
pub use filter::{
    default_filters, EqualityFilter, Filter, FilterLog, FilterPipeline, IntervalAttribute,
    IntervalFilter,
};
pub use firestorm::Firestorm;
pub use segment::{segment, Breakpoint, Phase, PhaseSegmenter, PhaseSummary};
pub use summary::summary;
pub use window::{ActivityWindow, ActivityWindowDetector};
