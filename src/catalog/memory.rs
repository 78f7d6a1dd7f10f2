//! In-memory record store
//!
//! Holds the catalog in memory with three indexes built once at load:
//! - folded-name order, for prefix range lookups by binary search
//! - trigram postings, to skip records that share no trigram with the query
//! - token postings plus corpus statistics, for full-text matching and rank

use super::record::Medicine;
use super::store::{Candidate, RecordStore, StoreError};
use crate::search::fulltext::{query_terms, Bm25Ranker, CorpusStats, TextRanker, TokenDoc};
use crate::search::strategy::{fold, fuzzy_matches, prefix_matches, substring_matches};
use crate::search::trigram::{Similarity, Trigram, TrigramSimilarity, Trigrams};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct Entry {
    record: Arc<Medicine>,
    folded: String,
    grams: Trigrams,
    tokens: TokenDoc,
}

/// Immutable index shared with blocking scan tasks
struct Index {
    entries: Vec<Entry>,
    /// Ordinals sorted by (folded name, name, id)
    by_folded: Vec<usize>,
    gram_postings: HashMap<Trigram, Vec<usize>>,
    term_postings: HashMap<String, Vec<usize>>,
    stats: CorpusStats,
    similarity: Arc<dyn Similarity>,
    ranker: Arc<dyn TextRanker>,
}

/// In-memory catalog. Every read runs on the blocking pool, so a caller
/// racing it against a deadline gets control back while the scan runs.
pub struct MemoryStore {
    inner: Arc<Index>,
}

impl MemoryStore {
    /// Build a store with the default trigram and BM25 backends
    pub fn new(records: Vec<Medicine>) -> Self {
        Self::with_backends(
            records,
            Arc::new(TrigramSimilarity),
            Arc::new(Bm25Ranker::default()),
        )
    }

    pub fn with_backends(
        records: Vec<Medicine>,
        similarity: Arc<dyn Similarity>,
        ranker: Arc<dyn TextRanker>,
    ) -> Self {
        let entries: Vec<Entry> = records
            .into_iter()
            .map(|record| Entry {
                folded: fold(&record.name),
                grams: Trigrams::of(&record.name),
                tokens: TokenDoc::from_text(&record.name),
                record: Arc::new(record),
            })
            .collect();

        let mut by_folded: Vec<usize> = (0..entries.len()).collect();
        by_folded.sort_by(|&a, &b| {
            let (ea, eb) = (&entries[a], &entries[b]);
            ea.folded
                .cmp(&eb.folded)
                .then_with(|| ea.record.name.cmp(&eb.record.name))
                .then_with(|| ea.record.id.cmp(&eb.record.id))
        });

        let mut gram_postings: HashMap<Trigram, Vec<usize>> = HashMap::new();
        let mut term_postings: HashMap<String, Vec<usize>> = HashMap::new();
        for (ordinal, entry) in entries.iter().enumerate() {
            for gram in entry.grams.iter() {
                gram_postings.entry(*gram).or_default().push(ordinal);
            }
            for term in entry.tokens.term_freqs.keys() {
                term_postings.entry(term.clone()).or_default().push(ordinal);
            }
        }

        let stats = CorpusStats::from_docs(entries.iter().map(|e| &e.tokens));

        debug!(
            "Built memory store: {} records, {} trigrams, {} terms (similarity={}, ranker={})",
            entries.len(),
            gram_postings.len(),
            term_postings.len(),
            similarity.name(),
            ranker.name()
        );

        Self {
            inner: Arc::new(Index {
                entries,
                by_folded,
                gram_postings,
                term_postings,
                stats,
                similarity,
                ranker,
            }),
        }
    }

    /// Run `scan` over the index on the blocking pool
    async fn read<T, F>(&self, text: &str, scan: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Index, &str) -> T + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || scan(&inner, &text))
            .await
            .map_err(|e| StoreError::Query(format!("scan task failed: {}", e)))
    }
}

impl Index {
    /// Mark records sharing at least one trigram with the query.
    /// `None` means every record must be scored.
    fn trigram_filter(&self, query_grams: &Trigrams, threshold: f64) -> Option<Vec<bool>> {
        if !self.similarity.requires_shared_trigram() || threshold <= 0.0 {
            return None;
        }
        let mut marks = vec![false; self.entries.len()];
        for gram in query_grams.iter() {
            if let Some(postings) = self.gram_postings.get(gram) {
                for &ordinal in postings {
                    marks[ordinal] = true;
                }
            }
        }
        Some(marks)
    }

    fn score(&self, text: &str, query_grams: &Trigrams, entry: &Entry) -> f64 {
        self.similarity
            .similarity_with_grams(text, query_grams, &entry.record.name, &entry.grams)
    }

    fn full_text_rank(&self, terms: &[String], entry: &Entry) -> Option<f64> {
        if entry.tokens.matches_all(terms) {
            Some(self.ranker.rank(terms, &entry.tokens, &self.stats))
        } else {
            None
        }
    }

    fn prefix(&self, text: &str) -> Vec<Arc<Medicine>> {
        let folded_query = fold(text);
        let start = self
            .by_folded
            .partition_point(|&o| self.entries[o].folded.as_str() < folded_query.as_str());

        self.by_folded[start..]
            .iter()
            .map(|&o| &self.entries[o])
            .take_while(|e| prefix_matches(&folded_query, &e.folded))
            .map(|e| Arc::clone(&e.record))
            .collect()
    }

    fn substring(&self, text: &str) -> Vec<(Arc<Medicine>, f64)> {
        let folded_query = fold(text);
        let query_grams = Trigrams::of(text);

        self.entries
            .iter()
            .filter(|e| substring_matches(&folded_query, &e.folded))
            .map(|e| (Arc::clone(&e.record), self.score(text, &query_grams, e)))
            .collect()
    }

    fn full_text(&self, text: &str) -> Vec<(Arc<Medicine>, f64)> {
        let terms = query_terms(text);
        let Some(postings) = terms.first().and_then(|t| self.term_postings.get(t)) else {
            return Vec::new();
        };

        postings
            .iter()
            .map(|&o| &self.entries[o])
            .filter_map(|e| {
                self.full_text_rank(&terms, e)
                    .map(|rank| (Arc::clone(&e.record), rank))
            })
            .collect()
    }

    fn similar(&self, text: &str, threshold: f64) -> Vec<(Arc<Medicine>, f64)> {
        let query_grams = Trigrams::of(text);
        let filter = self.trigram_filter(&query_grams, threshold);

        self.entries
            .iter()
            .enumerate()
            .filter(|(o, _)| filter.as_ref().map_or(true, |marks| marks[*o]))
            .filter_map(|(_, e)| {
                let sim = self.score(text, &query_grams, e);
                fuzzy_matches(sim, threshold).then(|| (Arc::clone(&e.record), sim))
            })
            .collect()
    }

    fn unified(&self, text: &str, floor: f64) -> Vec<Candidate> {
        let folded_query = fold(text);
        let query_grams = Trigrams::of(text);
        let terms = query_terms(text);
        let filter = self.trigram_filter(&query_grams, floor);

        self.entries
            .iter()
            .enumerate()
            .filter_map(|(o, e)| {
                let contains = substring_matches(&folded_query, &e.folded);
                let full_text_rank = self.full_text_rank(&terms, e);
                let similarity = match &filter {
                    Some(marks) if !marks[o] => 0.0,
                    _ => self.score(text, &query_grams, e),
                };

                let is_candidate =
                    contains || full_text_rank.is_some() || fuzzy_matches(similarity, floor);
                is_candidate.then(|| Candidate {
                    record: Arc::clone(&e.record),
                    full_text_rank,
                    similarity,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn prefix_match(&self, text: &str) -> Result<Vec<Arc<Medicine>>, StoreError> {
        self.read(text, |index, text| index.prefix(text)).await
    }

    async fn substring_match(
        &self,
        text: &str,
    ) -> Result<Vec<(Arc<Medicine>, f64)>, StoreError> {
        self.read(text, |index, text| index.substring(text)).await
    }

    async fn full_text_match(
        &self,
        text: &str,
    ) -> Result<Vec<(Arc<Medicine>, f64)>, StoreError> {
        self.read(text, |index, text| index.full_text(text)).await
    }

    async fn similar_match(
        &self,
        text: &str,
        threshold: f64,
    ) -> Result<Vec<(Arc<Medicine>, f64)>, StoreError> {
        self.read(text, move |index, text| index.similar(text, threshold))
            .await
    }

    async fn unified_candidates(
        &self,
        text: &str,
        floor: f64,
    ) -> Result<Vec<Candidate>, StoreError> {
        self.read(text, move |index, text| index.unified(text, floor))
            .await
    }

    fn similarity(&self, text: &str, name: &str) -> f64 {
        self.inner.similarity.similarity(text, name)
    }

    fn len(&self) -> usize {
        self.inner.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(names: &[&str]) -> MemoryStore {
        MemoryStore::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Medicine::named(format!("id{}", i), *n))
                .collect(),
        )
    }

    fn names(records: &[Arc<Medicine>]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_prefix_match_is_ordered_by_folded_name() {
        let s = store(&["Crocin", "avastin forte", "Avastin", "AVAPRO", "Zyrtec"]);
        let hits = s.prefix_match("AVA").await.unwrap();
        assert_eq!(names(&hits), vec!["AVAPRO", "Avastin", "avastin forte"]);
    }

    #[tokio::test]
    async fn test_prefix_match_no_hits() {
        let s = store(&["Crocin", "Zyrtec"]);
        assert!(s.prefix_match("qq").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_substring_match_scores_similarity() {
        let s = store(&["Dolo 650", "Paracetamol Dolo", "Crocin"]);
        let hits = s.substring_match("dolo").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(_, sim)| *sim > 0.0 && *sim <= 1.0));
    }

    #[tokio::test]
    async fn test_full_text_requires_all_terms() {
        let s = store(&["Crocin Advance Tablet", "Crocin Syrup", "Advance Tablet"]);
        let hits = s.full_text_match("crocin tablet").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "Crocin Advance Tablet");
        assert!(hits[0].1 > 0.0);

        assert!(s.full_text_match("!!!").await.unwrap().is_empty());
        assert!(s.full_text_match("unknownterm").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_similar_match_prefilter_agrees_with_full_scan() {
        struct ScanOnly;
        impl Similarity for ScanOnly {
            fn similarity(&self, a: &str, b: &str) -> f64 {
                TrigramSimilarity.similarity(a, b)
            }
            fn name(&self) -> &'static str {
                "scan-only"
            }
        }

        let names_list = ["Avastin", "Avastn", "Augmentin", "Crocin", "Zyrtec", "Avil"];
        let records: Vec<Medicine> = names_list
            .iter()
            .enumerate()
            .map(|(i, n)| Medicine::named(format!("id{}", i), *n))
            .collect();

        let indexed = MemoryStore::new(records.clone());
        let scanning = MemoryStore::with_backends(
            records,
            Arc::new(ScanOnly),
            Arc::new(Bm25Ranker::default()),
        );

        for threshold in [0.1, 0.3, 0.5] {
            let mut a: Vec<String> = indexed
                .similar_match("avastin", threshold)
                .await
                .unwrap()
                .into_iter()
                .map(|(r, _)| r.id.clone())
                .collect();
            let mut b: Vec<String> = scanning
                .similar_match("avastin", threshold)
                .await
                .unwrap()
                .into_iter()
                .map(|(r, _)| r.id.clone())
                .collect();
            a.sort();
            b.sort();
            assert_eq!(a, b, "threshold {}", threshold);
        }
    }

    #[tokio::test]
    async fn test_fullwidth_name_scores_like_ascii() {
        let s = store(&["ＡＢＣ", "xyz"]);
        let hits = s.similar_match("abc", 0.9).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "ＡＢＣ");
        assert!((hits[0].1 - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_the_index() {
        let s = store(&["Avastin", "Avastin Forte", "Crocin"]);
        let (unified, prefix, full_text) = tokio::join!(
            s.unified_candidates("avastin", 0.2),
            s.prefix_match("avastin"),
            s.full_text_match("crocin"),
        );
        assert_eq!(unified.unwrap().len(), 2);
        assert_eq!(prefix.unwrap().len(), 2);
        assert_eq!(full_text.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_similar_match_zero_threshold_returns_everything() {
        let s = store(&["abc", "xyz"]);
        assert_eq!(s.similar_match("abc", 0.0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unified_candidates_collect_signals() {
        let s = store(&["Avastin", "Avastin Forte", "Avastn", "Crocin"]);
        let candidates = s.unified_candidates("Avastin", 0.2).await.unwrap();
        let mut found: Vec<&str> = candidates.iter().map(|c| c.record.name.as_str()).collect();
        found.sort();
        assert_eq!(found, vec!["Avastin", "Avastin Forte", "Avastn"]);

        let typo = candidates.iter().find(|c| c.record.name == "Avastn").unwrap();
        assert!(typo.full_text_rank.is_none());
        assert!((typo.similarity - 0.5).abs() < 1e-12);
    }
}
