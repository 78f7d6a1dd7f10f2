//! Trigram similarity
//!
//! Compares strings by the overlap of their 3-character windows, using the
//! same word padding as PostgreSQL's pg_trgm: the text is case-folded the
//! same way as the match predicates (NFKC, then lowercase) and each
//! alphanumeric word is wrapped as `"  word "` before windows are taken. The score
//! is `shared / (|A| + |B| - shared)` and always lies in [0, 1].

use super::strategy::fold;

/// One 3-character window
pub type Trigram = [char; 3];

/// Sorted, de-duplicated trigram set of a string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trigrams(Vec<Trigram>);

impl Trigrams {
    /// Extract the trigram set of `text`
    pub fn of(text: &str) -> Self {
        let mut grams = Vec::new();
        let lowered = fold(text);

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
            for window in padded.windows(3) {
                grams.push([window[0], window[1], window[2]]);
            }
        }

        grams.sort_unstable();
        grams.dedup();
        Self(grams)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigram> {
        self.0.iter()
    }

    /// Number of trigrams present in both sets (merge over sorted vectors)
    pub fn shared(&self, other: &Trigrams) -> usize {
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < self.0.len() && j < other.0.len() {
            match self.0[i].cmp(&other.0[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }

    /// Jaccard-style similarity between two sets
    pub fn similarity(&self, other: &Trigrams) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let shared = self.shared(other);
        let union = self.len() + other.len() - shared;
        shared as f64 / union as f64
    }
}

/// Pluggable string-similarity primitive
///
/// Contract: returns a value in [0, 1], higher means closer, and the same
/// inputs always produce the same value.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    /// Score with trigram sets already extracted by the caller
    fn similarity_with_grams(
        &self,
        query: &str,
        _query_grams: &Trigrams,
        name: &str,
        _name_grams: &Trigrams,
    ) -> f64 {
        self.similarity(query, name)
    }

    /// Whether a positive score implies at least one shared trigram.
    /// Stores use this to decide if a trigram index can pre-filter candidates.
    fn requires_shared_trigram(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Default backend: pg_trgm-compatible trigram similarity
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigramSimilarity;

impl Similarity for TrigramSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        Trigrams::of(a).similarity(&Trigrams::of(b))
    }

    fn similarity_with_grams(
        &self,
        _query: &str,
        query_grams: &Trigrams,
        _name: &str,
        name_grams: &Trigrams,
    ) -> f64 {
        query_grams.similarity(name_grams)
    }

    fn requires_shared_trigram(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "trigram"
    }
}
