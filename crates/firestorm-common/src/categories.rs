//! Categorical taxonomies for post classification.
//!
//! This module defines the closed category sets a post is labelled with
//! upstream and the typed [`Category`] used to select posts by value:
//! - [`TweetType`]: how the post relates to other posts
//! - [`UserType`]: activity class of the author within the firestorm
//! - language (open set) and the boolean offensiveness / URL flags
//!
//! Rate-table configuration names categories by strings (`column`, `value`).
//! [`Category::parse`] resolves those strings against the record schema and
//! fails with [`Error::UnknownCategory`] for a column that does not exist or
//! a value outside a closed set. A value that merely never occurs in the
//! data is valid and simply yields a rate of zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::record::Record;

/// Relation of a post to other posts, derived from its first reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweetType {
    /// No referenced post.
    #[serde(rename = "original tweet", alias = "original")]
    Original,
    /// Reply to another post.
    #[serde(rename = "reply")]
    Reply,
    /// Retweet with comment (quote).
    #[serde(rename = "retweet with comment", alias = "quoted")]
    Quoted,
    /// Plain retweet.
    #[serde(rename = "retweet without comment", alias = "retweet-without-comment")]
    Retweet,
}

impl TweetType {
    /// All variants in table-column order.
    pub fn all() -> &'static [TweetType] {
        &[
            TweetType::Retweet,
            TweetType::Original,
            TweetType::Reply,
            TweetType::Quoted,
        ]
    }

    /// Canonical label as stored in the document schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            TweetType::Original => "original tweet",
            TweetType::Reply => "reply",
            TweetType::Quoted => "retweet with comment",
            TweetType::Retweet => "retweet without comment",
        }
    }

    /// Derive the type from the first reference type of a post.
    ///
    /// `None` means the post references nothing and is an original post.
    pub fn from_reference_type(reference_type: Option<&str>) -> Result<Self> {
        match reference_type {
            None => Ok(TweetType::Original),
            Some("quoted") => Ok(TweetType::Quoted),
            Some("retweeted") => Ok(TweetType::Retweet),
            Some("replied_to") => Ok(TweetType::Reply),
            Some(other) => Err(Error::unknown_category("referenced_tweets.type", other)),
        }
    }
}

impl fmt::Display for TweetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TweetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "original tweet" | "original" => Ok(TweetType::Original),
            "reply" => Ok(TweetType::Reply),
            "retweet with comment" | "quoted" => Ok(TweetType::Quoted),
            "retweet without comment" | "retweet-without-comment" | "retweet" => {
                Ok(TweetType::Retweet)
            }
            _ => Err(Error::unknown_category(Column::TweetType.as_str(), s)),
        }
    }
}

/// Activity class of a post's author within one firestorm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    /// Bottom 90% of authors by post count.
    #[serde(rename = "laggard", alias = "lurking")]
    Laggard,
    /// Authors between the top 1% and top 10%.
    #[serde(rename = "active")]
    Active,
    /// Top 1% of authors by post count.
    #[serde(rename = "hyper-active")]
    HyperActive,
}

impl UserType {
    pub fn all() -> &'static [UserType] {
        &[UserType::Laggard, UserType::Active, UserType::HyperActive]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Laggard => "laggard",
            UserType::Active => "active",
            UserType::HyperActive => "hyper-active",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "laggard" | "lurking" => Ok(UserType::Laggard),
            "active" => Ok(UserType::Active),
            "hyper-active" | "hyper_active" => Ok(UserType::HyperActive),
            _ => Err(Error::unknown_category(Column::UserType.as_str(), s)),
        }
    }
}

/// Categorical record attribute that a rate or equality filter can select on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    TweetType,
    UserType,
    Lang,
    IsOffensive,
    ContainsUrl,
}

impl Column {
    pub fn all() -> &'static [Column] {
        &[
            Column::TweetType,
            Column::UserType,
            Column::Lang,
            Column::IsOffensive,
            Column::ContainsUrl,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::TweetType => "tweet_type",
            Column::UserType => "user_type",
            Column::Lang => "lang",
            Column::IsOffensive => "is_offensive",
            Column::ContainsUrl => "contains_url",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Column::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| Error::unknown_category(s, "*"))
    }
}

/// A single `(column, value)` selection resolved against the record schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "column", content = "value", rename_all = "snake_case")]
pub enum Category {
    TweetType(TweetType),
    UserType(UserType),
    Lang(String),
    IsOffensive(bool),
    ContainsUrl(bool),
}

impl Category {
    /// Resolve a `(column, value)` pair given as strings.
    pub fn parse(column: &str, value: &str) -> Result<Self> {
        let column = column.parse::<Column>()?;
        match column {
            Column::TweetType => Ok(Category::TweetType(value.parse()?)),
            Column::UserType => Ok(Category::UserType(value.parse()?)),
            Column::Lang => {
                let lang = value.trim();
                if lang.is_empty() {
                    return Err(Error::unknown_category(column.as_str(), value));
                }
                Ok(Category::Lang(lang.to_string()))
            }
            Column::IsOffensive | Column::ContainsUrl => {
                let flag = parse_flag(value)
                    .ok_or_else(|| Error::unknown_category(column.as_str(), value))?;
                Ok(match column {
                    Column::IsOffensive => Category::IsOffensive(flag),
                    _ => Category::ContainsUrl(flag),
                })
            }
        }
    }

    pub fn column(&self) -> Column {
        match self {
            Category::TweetType(_) => Column::TweetType,
            Category::UserType(_) => Column::UserType,
            Category::Lang(_) => Column::Lang,
            Category::IsOffensive(_) => Column::IsOffensive,
            Category::ContainsUrl(_) => Column::ContainsUrl,
        }
    }

    /// Whether the record carries this category. Null attributes never match.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Category::TweetType(t) => record.tweet_type == Some(*t),
            Category::UserType(u) => record.user_type == Some(*u),
            Category::Lang(lang) => record.lang == *lang,
            Category::IsOffensive(flag) => record.is_offensive == Some(*flag),
            Category::ContainsUrl(flag) => record.contains_url == Some(*flag),
        }
    }

    /// Value part rendered the way configuration spells it.
    pub fn value_label(&self) -> String {
        match self {
            Category::TweetType(t) => t.as_str().to_string(),
            Category::UserType(u) => u.as_str().to_string(),
            Category::Lang(lang) => lang.clone(),
            Category::IsOffensive(flag) | Category::ContainsUrl(flag) => flag.to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column(), self.value_label())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_type_from_reference() {
        assert_eq!(
            TweetType::from_reference_type(None).unwrap(),
            TweetType::Original
        );
        assert_eq!(
            TweetType::from_reference_type(Some("quoted")).unwrap(),
            TweetType::Quoted
        );
        assert_eq!(
            TweetType::from_reference_type(Some("retweeted")).unwrap(),
            TweetType::Retweet
        );
        assert_eq!(
            TweetType::from_reference_type(Some("replied_to")).unwrap(),
            TweetType::Reply
        );
        assert!(matches!(
            TweetType::from_reference_type(Some("liked")),
            Err(Error::UnknownCategory { .. })
        ));
    }

    #[test]
    fn tweet_type_serde_uses_stored_labels() {
        let json = serde_json::to_string(&TweetType::Retweet).unwrap();
        assert_eq!(json, "\"retweet without comment\"");
        let parsed: TweetType = serde_json::from_str("\"quoted\"").unwrap();
        assert_eq!(parsed, TweetType::Quoted);
    }

    #[test]
    fn category_parse_resolves_known_values() {
        assert_eq!(
            Category::parse("tweet_type", "retweet without comment").unwrap(),
            Category::TweetType(TweetType::Retweet)
        );
        assert_eq!(
            Category::parse("user_type", "hyper-active").unwrap(),
            Category::UserType(UserType::HyperActive)
        );
        assert_eq!(
            Category::parse("lang", "de").unwrap(),
            Category::Lang("de".into())
        );
        assert_eq!(
            Category::parse("is_offensive", "true").unwrap(),
            Category::IsOffensive(true)
        );
        assert_eq!(
            Category::parse("contains_url", "false").unwrap(),
            Category::ContainsUrl(false)
        );
    }

    #[test]
    fn category_parse_rejects_unknown_schema() {
        assert!(matches!(
            Category::parse("sentiment", "positive"),
            Err(Error::UnknownCategory { .. })
        ));
        assert!(matches!(
            Category::parse("tweet_type", "thread"),
            Err(Error::UnknownCategory { .. })
        ));
        assert!(matches!(
            Category::parse("is_offensive", "maybe"),
            Err(Error::UnknownCategory { .. })
        ));
        assert!(matches!(
            Category::parse("lang", "  "),
            Err(Error::UnknownCategory { .. })
        ));
    }

    #[test]
    fn category_display() {
        let c = Category::TweetType(TweetType::Reply);
        assert_eq!(c.to_string(), "tweet_type=reply");
    }
}
