//! Upstream enrichment helpers.
//!
//! Author activity classes are relative to one firestorm: authors are ranked
//! by how many posts they contributed, the top 1% are hyper-active, the next
//! 9% active and everyone else a laggard. Integer division decides the cut
//! points, so firestorms with fewer than 100 authors have no hyper-active
//! users.

use std::collections::HashMap;

use crate::categories::UserType;
use crate::id::AuthorId;
use crate::record::{Attribute, Record};

/// Author-to-class assignment for one firestorm.
#[derive(Debug, Clone, Default)]
pub struct UserGroups {
    classes: HashMap<AuthorId, UserType>,
    post_counts: HashMap<AuthorId, u64>,
}

impl UserGroups {
    /// Rank the authors of `records` by post count.
    ///
    /// Ties are broken by author id so the assignment is deterministic.
    /// Records without an author are ignored.
    pub fn rank(records: &[Record]) -> Self {
        let mut post_counts: HashMap<AuthorId, u64> = HashMap::new();
        for author in records.iter().filter_map(|r| r.author_id) {
            *post_counts.entry(author).or_insert(0) += 1;
        }

        let mut ranked: Vec<(AuthorId, u64)> =
            post_counts.iter().map(|(a, n)| (*a, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let hyper_cut = ranked.len() / 100;
        let active_cut = ranked.len() / 10;
        let classes = ranked
            .iter()
            .enumerate()
            .map(|(rank, (author, _))| {
                let class = if rank < hyper_cut {
                    UserType::HyperActive
                } else if rank < active_cut {
                    UserType::Active
                } else {
                    UserType::Laggard
                };
                (*author, class)
            })
            .collect();

        tracing::debug!(
            authors = ranked.len(),
            hyper_active = hyper_cut,
            active = active_cut.saturating_sub(hyper_cut),
            "ranked authors by activity"
        );

        UserGroups {
            classes,
            post_counts,
        }
    }

    pub fn class_of(&self, author: AuthorId) -> Option<UserType> {
        self.classes.get(&author).copied()
    }

    pub fn posts_by(&self, author: AuthorId) -> u64 {
        self.post_counts.get(&author).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Label every record with its author's class and firestorm activity.
    ///
    /// Records whose author is unknown are returned unchanged.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .map(|record| match record.author_id {
                Some(author) => match self.class_of(author) {
                    Some(class) => record
                        .with_attribute(Attribute::UserType(class))
                        .with_attribute(Attribute::FirestormActivity(self.posts_by(author))),
                    None => record,
                },
                None => record,
            })
            .collect()
    }
}
