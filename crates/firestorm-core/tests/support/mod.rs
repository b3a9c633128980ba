//! Record builders shared by the integration tests.

#![allow(dead_code)]
// Not every test binary uses every builder.

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use firestorm_common::{Attribute, Record, TweetType, UserType};

pub fn cet() -> FixedOffset {
    FixedOffset::east_opt(3600).expect("valid offset")
}

/// Midnight of 2021-04-13 in UTC+1.
pub fn day_zero() -> DateTime<FixedOffset> {
    cet()
        .with_ymd_and_hms(2021, 4, 13, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn hour(h: i64) -> DateTime<FixedOffset> {
    day_zero() + Duration::hours(h)
}

/// `counts[h]` German records spread over hour `h` after day zero.
///
/// Row `h` of the hourly table is hour `h` as long as the first day has at
/// least one record.
pub fn records_per_hour(counts: &[usize]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut id = 0u64;
    for (h, &count) in counts.iter().enumerate() {
        for k in 0..count {
            id += 1;
            let seconds = (k as i64 * 3599) / count.max(1) as i64;
            records.push(Record::new(
                id,
                hour(h as i64) + Duration::seconds(seconds),
                "de",
            ));
        }
    }
    records
}

/// Records whose categorical mix switches at `switch_hour`.
///
/// Before the switch posts are mostly retweets by laggards; afterwards mostly
/// original posts and replies by active authors.
pub fn regime_shift(hours: usize, switch_hour: usize, per_hour: usize) -> Vec<Record> {
    let mut records = Vec::new();
    let mut id = 0u64;
    for h in 0..hours {
        for k in 0..per_hour {
            id += 1;
            let (tweet_type, user_type) = if h < switch_hour {
                match k % 10 {
                    0 => (TweetType::Original, UserType::Active),
                    _ => (TweetType::Retweet, UserType::Laggard),
                }
            } else {
                match k % 10 {
                    0..=4 => (TweetType::Original, UserType::Active),
                    5..=7 => (TweetType::Reply, UserType::HyperActive),
                    _ => (TweetType::Retweet, UserType::Laggard),
                }
            };
            let at = hour(h as i64) + Duration::seconds((k * 3599 / per_hour.max(1)) as i64);
            records.push(
                Record::new(id, at, "de")
                    .with_attribute(Attribute::TweetType(tweet_type))
                    .with_attribute(Attribute::UserType(user_type)),
            );
        }
    }
    records
}
