//! Fetch report surfaced by the search-API collaborator.
//!
//! The fetcher paginates sequentially with a fixed delay between requests and
//! can resume from its last continuation token. The engine never talks to the
//! network; it only reads these reports to decide whether a collection is
//! complete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one paginated fetch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    /// Query the posts were fetched with.
    pub query: String,

    /// Fetching stops once at least this many posts were received.
    pub fetch_limit: u64,

    pub started_fetching: DateTime<Utc>,

    #[serde(default)]
    pub finished_fetching: Option<DateTime<Utc>>,

    pub fetched_total: u64,

    /// Continuation token to resume from, if more pages remain.
    #[serde(default)]
    pub next_token: Option<String>,

    /// Terminal error that interrupted the run.
    #[serde(default)]
    pub interrupt: Option<String>,
}

impl FetchReport {
    /// The run ended without an error and no pages remain.
    pub fn is_complete(&self) -> bool {
        self.interrupt.is_none() && self.next_token.is_none()
    }

    /// The run can be resumed with [`FetchReport::next_token`].
    pub fn is_resumable(&self) -> bool {
        self.next_token.is_some()
    }

    /// The run stopped because the fetch limit was reached.
    pub fn hit_limit(&self) -> bool {
        self.fetched_total >= self.fetch_limit && self.next_token.is_some()
    }
}
