//! Record store capability interface
//!
//! The search engine reads the catalog only through [`RecordStore`]. Each
//! method is one logical read; implementations may back it with a database
//! query or an in-memory index.

use super::record::Medicine;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Transient backend failure. Callers may retry; the engine never does.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store query failed: {0}")]
    Query(String),
}

/// Per-record signals gathered for unified ranking
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: Arc<Medicine>,
    /// Full-text rank, `None` when the record did not match full-text
    pub full_text_rank: Option<f64>,
    /// Similarity to the query (may be below the floor for text-only matches)
    pub similarity: f64,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose folded name starts with `text`, ordered by folded name
    async fn prefix_match(&self, text: &str) -> Result<Vec<Arc<Medicine>>, StoreError>;

    /// Records whose folded name contains `text`, with similarity
    async fn substring_match(&self, text: &str)
        -> Result<Vec<(Arc<Medicine>, f64)>, StoreError>;

    /// Records matching `text` under full-text semantics, with rank
    async fn full_text_match(&self, text: &str)
        -> Result<Vec<(Arc<Medicine>, f64)>, StoreError>;

    /// Records whose similarity to `text` is at least `threshold`
    async fn similar_match(
        &self,
        text: &str,
        threshold: f64,
    ) -> Result<Vec<(Arc<Medicine>, f64)>, StoreError>;

    /// Records satisfying any unified predicate: containment, full-text
    /// match, or similarity at least `floor`. One candidate per record.
    async fn unified_candidates(&self, text: &str, floor: f64)
        -> Result<Vec<Candidate>, StoreError>;

    /// Raw similarity primitive, in [0, 1]
    fn similarity(&self, text: &str, name: &str) -> f64;

    /// Number of records held
    fn len(&self) -> usize;
}
