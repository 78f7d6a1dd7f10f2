//! Ranking & ordering keys
//!
//! Results are ordered by a typed, lexicographic key rather than one blended
//! score: each component only breaks ties left by the one before it. Keys
//! sort ascending, so descending components are wrapped in `Reverse`.
//!
//! Single-strategy keys:
//! - `prefix`: folded name, name, id
//! - `substring` / `fulltext` / `fuzzy`: score desc, name, id
//!
//! Unified key (boost values are the constants below):
//! 1. relevance boost desc (exact 1.0 > prefix 0.9 > none 0.0)
//! 2. full-text rank desc (0 when not a full-text match)
//! 3. similarity desc (0 when below the candidate floor)
//! 4. name length asc
//! 5. name asc (case-sensitive), then id

use super::strategy::{fold, prefix_matches};
use crate::catalog::{Candidate, Medicine};
use std::cmp::{Ordering, Reverse};
use std::sync::Arc;

/// Boost when the name equals the query, case-insensitively
pub const EXACT_BOOST: f64 = 1.0;
/// Boost when the name starts with the query, case-insensitively
pub const PREFIX_BOOST: f64 = 0.9;
pub const NO_BOOST: f64 = 0.0;

/// Totally ordered score; NaN is treated as 0
#[derive(Debug, Clone, Copy)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Score(0.0)
        } else {
            Score(value)
        }
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        // -0.0 and 0.0 must tie
        if self.0 == other.0 {
            Ordering::Equal
        } else {
            self.0.total_cmp(&other.0)
        }
    }
}

/// Relevance boost tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boost {
    None,
    Prefix,
    Exact,
}

impl Boost {
    pub fn of(folded_query: &str, folded_name: &str) -> Self {
        if folded_name == folded_query {
            Boost::Exact
        } else if prefix_matches(folded_query, folded_name) {
            Boost::Prefix
        } else {
            Boost::None
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Boost::Exact => EXACT_BOOST,
            Boost::Prefix => PREFIX_BOOST,
            Boost::None => NO_BOOST,
        }
    }
}

/// Ordering key; derived `Ord` compares fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderingKey {
    Folded {
        folded_name: String,
        name: String,
        id: String,
    },
    Scored {
        score: Reverse<Score>,
        name: String,
        id: String,
    },
    Unified {
        boost: Reverse<Score>,
        full_text_rank: Reverse<Score>,
        similarity: Reverse<Score>,
        name_len: usize,
        name: String,
        id: String,
    },
}

impl OrderingKey {
    pub fn prefix(record: &Medicine) -> Self {
        OrderingKey::Folded {
            folded_name: fold(&record.name),
            name: record.name.clone(),
            id: record.id.clone(),
        }
    }

    pub fn scored(record: &Medicine, score: f64) -> Self {
        OrderingKey::Scored {
            score: Reverse(Score::new(score)),
            name: record.name.clone(),
            id: record.id.clone(),
        }
    }

    pub fn unified(candidate: &Candidate, folded_query: &str, floor: f64) -> Self {
        let record = &candidate.record;
        let similarity = if candidate.similarity >= floor {
            candidate.similarity
        } else {
            0.0
        };

        OrderingKey::Unified {
            boost: Reverse(Score::new(Boost::of(folded_query, &fold(&record.name)).value())),
            full_text_rank: Reverse(Score::new(candidate.full_text_rank.unwrap_or(0.0))),
            similarity: Reverse(Score::new(similarity)),
            name_len: record.name.chars().count(),
            name: record.name.clone(),
            id: record.id.clone(),
        }
    }
}

/// A record paired with its ordering key
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub record: Arc<Medicine>,
    pub key: OrderingKey,
}

impl ScoredMatch {
    pub fn new(record: Arc<Medicine>, key: OrderingKey) -> Self {
        Self { record, key }
    }
}

/// Order matches by key and keep the first `limit`
///
/// Keys are total (they end in the unique id), so selecting the top `limit`
/// before sorting yields the same list as a full sort then truncate.
pub fn rank_matches(mut matches: Vec<ScoredMatch>, limit: usize) -> Vec<ScoredMatch> {
    if limit == 0 {
        return Vec::new();
    }
    if matches.len() > limit {
        matches.select_nth_unstable_by(limit - 1, |a, b| a.key.cmp(&b.key));
        matches.truncate(limit);
    }
    matches.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    matches
}
