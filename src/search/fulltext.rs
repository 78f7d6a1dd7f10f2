//! Full-text tokenization and ranking
//!
//! Tokenization follows the "simple" text-search configuration: Unicode word
//! segmentation, lowercasing, no stemming and no stop words. A document
//! matches a query when it contains every distinct query token.

use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Split text into lowercase word tokens, in order, duplicates kept
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text.nfkc().collect();
    normalized
        .unicode_words()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Distinct query tokens in first-seen order
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(text) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Token view of one indexed document
#[derive(Debug, Clone, Default)]
pub struct TokenDoc {
    pub term_freqs: HashMap<String, u32>,
    pub len: u32,
}

impl TokenDoc {
    pub fn from_text(text: &str) -> Self {
        let mut term_freqs = HashMap::new();
        let mut len = 0u32;
        for token in tokenize(text) {
            *term_freqs.entry(token).or_insert(0) += 1;
            len += 1;
        }
        Self { term_freqs, len }
    }

    pub fn tf(&self, term: &str) -> u32 {
        self.term_freqs.get(term).copied().unwrap_or(0)
    }

    /// Plain AND match: every term present. No terms matches nothing.
    pub fn matches_all(&self, terms: &[String]) -> bool {
        !terms.is_empty() && terms.iter().all(|t| self.term_freqs.contains_key(t))
    }
}

/// Corpus-level statistics needed by rankers
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    pub total_docs: usize,
    pub doc_freqs: HashMap<String, usize>,
    pub avg_doc_len: f64,
}

impl CorpusStats {
    pub fn from_docs<'a>(docs: impl IntoIterator<Item = &'a TokenDoc>) -> Self {
        let mut stats = CorpusStats::default();
        let mut total_len = 0u64;
        for doc in docs {
            stats.total_docs += 1;
            total_len += doc.len as u64;
            for term in doc.term_freqs.keys() {
                *stats.doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
        }
        if stats.total_docs > 0 {
            stats.avg_doc_len = total_len as f64 / stats.total_docs as f64;
        }
        stats
    }

    /// Smoothed IDF: ln((N - df + 0.5) / (df + 0.5) + 1)
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f64;
        let n = self.total_docs as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

/// Pluggable full-text relevance function
///
/// Contract: non-negative, higher means more relevant, deterministic.
/// Scores are unbounded and only comparable within one query.
pub trait TextRanker: Send + Sync {
    fn rank(&self, terms: &[String], doc: &TokenDoc, stats: &CorpusStats) -> f64;

    fn name(&self) -> &'static str;
}

/// BM25 ranker
#[derive(Debug, Clone, Copy)]
pub struct Bm25Ranker {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Ranker {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl TextRanker for Bm25Ranker {
    fn rank(&self, terms: &[String], doc: &TokenDoc, stats: &CorpusStats) -> f64 {
        let avg_len = if stats.avg_doc_len > 0.0 {
            stats.avg_doc_len
        } else {
            1.0
        };
        let dl = doc.len as f64;

        terms
            .iter()
            .map(|term| {
                let tf = doc.tf(term) as f64;
                if tf == 0.0 {
                    return 0.0;
                }
                let norm = self.k1 * (1.0 - self.b + self.b * dl / avg_len);
                stats.idf(term) * tf * (self.k1 + 1.0) / (tf + norm)
            })
            .sum()
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}
