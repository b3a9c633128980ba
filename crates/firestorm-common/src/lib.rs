//! Firestorm common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the engine crates:
//! - Record identity and the canonical post record
//! - The civil time zone timestamps are normalized to
//! - Category taxonomies (post type, author class, language, flags)
//! - The unified error type with stable codes
//! - Upstream enrichment helpers and the fetch report shape

pub mod categories;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod id;
pub mod record;
pub mod zone;

pub use categories::{Category, Column, TweetType, UserType};
pub use enrich::UserGroups;
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use fetch::FetchReport;
pub use id::{AuthorId, RecordId};
pub use record::{parse_records, Attribute, AttributeKind, EpochMillis, Record, RecordInput};
pub use zone::{Zone, DEFAULT_ZONE};
