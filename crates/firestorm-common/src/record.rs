//! Canonical post record.
//!
//! Records arrive as JSON produced by the storage collaborator. Timestamps are
//! epoch milliseconds there (bare or wrapped as `{"$date": ms}`); they are
//! normalized once to the engine's civil [`Zone`] by
//! [`RecordInput::normalize`] and never touched again.
//!
//! Enrichment attributes are set upstream through [`Record::with_attribute`],
//! which returns a new record instead of mutating in place.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::{TweetType, UserType};
use crate::error::{Error, Result};
use crate::id::{AuthorId, RecordId};
use crate::zone::Zone;

/// One post, normalized to the engine's time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,

    #[serde(default)]
    pub author_id: Option<AuthorId>,

    pub created_at: DateTime<FixedOffset>,

    pub lang: String,

    #[serde(default)]
    pub tweet_type: Option<TweetType>,

    #[serde(default)]
    pub user_type: Option<UserType>,

    /// Only labelled for target-language posts.
    #[serde(default)]
    pub is_offensive: Option<bool>,

    #[serde(default)]
    pub contains_url: Option<bool>,

    /// Posts by the author overall.
    #[serde(default)]
    pub user_activity: Option<u64>,

    /// Posts by the author within this firestorm.
    #[serde(default)]
    pub firestorm_activity: Option<u64>,
}

impl Record {
    /// Minimal record; enrichment attributes start out null.
    pub fn new(id: impl Into<RecordId>, created_at: DateTime<FixedOffset>, lang: &str) -> Self {
        Record {
            id: id.into(),
            author_id: None,
            created_at,
            lang: lang.to_string(),
            tweet_type: None,
            user_type: None,
            is_offensive: None,
            contains_url: None,
            user_activity: None,
            firestorm_activity: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<AuthorId>) -> Self {
        self.author_id = Some(author.into());
        self
    }

    /// Return a copy with one enrichment attribute set.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        match attribute {
            Attribute::TweetType(t) => self.tweet_type = Some(t),
            Attribute::ContainsUrl(flag) => self.contains_url = Some(flag),
            Attribute::UserType(u) => self.user_type = Some(u),
            Attribute::IsOffensive(flag) => self.is_offensive = flag,
            Attribute::UserActivity(n) => self.user_activity = Some(n),
            Attribute::FirestormActivity(n) => self.firestorm_activity = Some(n),
        }
        self
    }

    /// Whether an enrichment attribute has been set.
    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::TweetType => self.tweet_type.is_some(),
            AttributeKind::ContainsUrl => self.contains_url.is_some(),
            AttributeKind::UserType => self.user_type.is_some(),
            AttributeKind::IsOffensive => self.is_offensive.is_some(),
            AttributeKind::UserActivity => self.user_activity.is_some(),
            AttributeKind::FirestormActivity => self.firestorm_activity.is_some(),
        }
    }

    /// Calendar day of the post in the normalized zone.
    pub fn local_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Enrichment attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    TweetType,
    ContainsUrl,
    UserType,
    IsOffensive,
    UserActivity,
    FirestormActivity,
}

/// A typed enrichment value, one variant per [`AttributeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    TweetType(TweetType),
    ContainsUrl(bool),
    UserType(UserType),
    /// `None` for posts the classifier does not cover.
    IsOffensive(Option<bool>),
    UserActivity(u64),
    FirestormActivity(u64),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::TweetType(_) => AttributeKind::TweetType,
            Attribute::ContainsUrl(_) => AttributeKind::ContainsUrl,
            Attribute::UserType(_) => AttributeKind::UserType,
            Attribute::IsOffensive(_) => AttributeKind::IsOffensive,
            Attribute::UserActivity(_) => AttributeKind::UserActivity,
            Attribute::FirestormActivity(_) => AttributeKind::FirestormActivity,
        }
    }
}

/// Epoch-millisecond timestamp as exported by the storage layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EpochMillis {
    Bare(i64),
    Wrapped {
        #[serde(rename = "$date")]
        date: i64,
    },
    Rfc3339(String),
}

impl EpochMillis {
    fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            EpochMillis::Bare(ms) | EpochMillis::Wrapped { date: ms } => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| Error::InvalidTimestamp(format!("{} ms is out of range", ms))),
            EpochMillis::Rfc3339(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::InvalidTimestamp(format!("'{}': {}", s, e))),
        }
    }
}

/// Record shape as it arrives from storage, before time-zone normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInput {
    pub id: RecordId,
    #[serde(default)]
    pub author_id: Option<AuthorId>,
    pub created_at: EpochMillis,
    pub lang: String,
    #[serde(default)]
    pub tweet_type: Option<TweetType>,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub is_offensive: Option<bool>,
    #[serde(default)]
    pub contains_url: Option<bool>,
    #[serde(default)]
    pub user_activity: Option<u64>,
    #[serde(default)]
    pub firestorm_activity: Option<u64>,
}

impl RecordInput {
    /// Convert the timestamp into `zone` and produce the canonical record.
    pub fn normalize(self, zone: &Zone) -> Result<Record> {
        let created_at = zone.localize(&self.created_at.to_utc()?);
        Ok(Record {
            id: self.id,
            author_id: self.author_id,
            created_at,
            lang: self.lang,
            tweet_type: self.tweet_type,
            user_type: self.user_type,
            is_offensive: self.is_offensive,
            contains_url: self.contains_url,
            user_activity: self.user_activity,
            firestorm_activity: self.firestorm_activity,
        })
    }
}

/// Parse a JSON array of storage records and normalize them to `zone`.
pub fn parse_records(json: &str, zone: &Zone) -> Result<Vec<Record>> {
    let inputs: Vec<RecordInput> = serde_json::from_str(json)?;
    let records = inputs
        .into_iter()
        .map(|input| input.normalize(zone))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = records.len(), zone = %zone, "parsed records");
    Ok(records)
}
