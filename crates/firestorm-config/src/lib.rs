//! Firestorm engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for engine.json (aggregation, window, segmentation)
//! - The firestorm catalog of query descriptors
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots for reproducible runs

pub mod catalog;
pub mod engine;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use catalog::{Catalog, FirestormDescriptor};
pub use engine::{
    AggregationConfig, EngineConfig, FilterConfig, SegmentationConfig, TrackedRateSpec,
    WindowConfig,
};
pub use resolve::{load_config, resolve_config, ConfigPaths, ConfigSource, LoadedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_engine_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
