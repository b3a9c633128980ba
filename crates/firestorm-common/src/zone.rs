//! Civil time zone every timestamp is normalized to.
//!
//! Posts are stored as UTC instants. Day grouping, interval padding and the
//! catalog's whole-day windows all happen in one civil zone, by default
//! `Europe/Berlin` with its daylight-saving switches. A fixed offset can be
//! configured instead.
//!
//! Normalized timestamps are `DateTime<FixedOffset>` carrying the zone's
//! offset at that instant (`+01:00` in winter, `+02:00` in summer for Berlin).

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Zone the original collection was analysed in.
pub const DEFAULT_ZONE: Tz = chrono_tz::Europe::Berlin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// IANA zone with daylight saving.
    Named(Tz),
    /// Constant offset, no daylight saving.
    Fixed(FixedOffset),
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Named(DEFAULT_ZONE)
    }
}

impl Zone {
    /// Parse an IANA name such as `Europe/Berlin`.
    pub fn named(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|e| Error::Config(format!("unknown time zone '{}': {}", name, e)))
    }

    /// Fixed offset in minutes east of UTC.
    pub fn fixed_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Zone::Fixed)
            .ok_or_else(|| Error::Config(format!("offset of {} minutes is out of range", minutes)))
    }

    /// `t` as civil time in this zone.
    pub fn localize<T: TimeZone>(&self, t: &DateTime<T>) -> DateTime<FixedOffset> {
        let utc = t.with_timezone(&Utc);
        match self {
            Zone::Named(tz) => {
                let local = utc.with_timezone(tz);
                let offset = local.offset().fix();
                local.with_timezone(&offset)
            }
            Zone::Fixed(offset) => utc.with_timezone(offset),
        }
    }

    /// Offset in effect at `t`.
    pub fn offset_at<T: TimeZone>(&self, t: &DateTime<T>) -> FixedOffset {
        *self.localize(t).offset()
    }

    /// Instants showing wall-clock time `local` in this zone.
    ///
    /// Empty inside a daylight-saving gap, two instants inside a repeated
    /// hour.
    pub fn instants_at(&self, local: NaiveDateTime) -> Vec<DateTime<FixedOffset>> {
        match self {
            Zone::Named(tz) => match tz.from_local_datetime(&local) {
                LocalResult::Single(t) => vec![self.localize(&t)],
                LocalResult::Ambiguous(a, b) => vec![self.localize(&a), self.localize(&b)],
                LocalResult::None => Vec::new(),
            },
            Zone::Fixed(offset) => offset
                .from_local_datetime(&local)
                .single()
                .into_iter()
                .collect(),
        }
    }

    /// First instant of `date` in this zone.
    ///
    /// `None` only if midnight itself is skipped by a daylight-saving jump.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        self.instants_at(date.and_hms_opt(0, 0, 0)?).into_iter().min()
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Named(tz) => f.write_str(tz.name()),
            Zone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Zone::Fixed(offset)
    }
}
