//! Record and author identity types.
//!
//! Post and author ids are 64-bit integers. Upstream exports carry them
//! either as JSON numbers (document store) or as decimal strings (search
//! API), so both forms deserialize.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericOrString {
    Numeric(u64),
    Text(String),
}

fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumericOrString::deserialize(deserializer)? {
        NumericOrString::Numeric(n) => Ok(n),
        NumericOrString::Text(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

/// Unique, immutable post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(#[serde(deserialize_with = "deserialize_u64_lenient")] pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        RecordId(id)
    }
}

/// Author identifier, used to rank users by activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(#[serde(deserialize_with = "deserialize_u64_lenient")] pub u64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AuthorId {
    fn from(id: u64) -> Self {
        AuthorId(id)
    }
}
