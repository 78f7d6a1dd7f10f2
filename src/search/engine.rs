//! Query evaluator
//!
//! Ties together validation, the store read and ranking:
//! 1. resolve the query (validation and defaults, no store access)
//! 2. short-circuit empty text to an empty result
//! 3. one store read for the strategy, raced against the cancel signal
//! 4. key every match, order fully, keep the top `limit`

use super::query::{Query, ResolvedQuery};
use super::ranking::{rank_matches, OrderingKey, ScoredMatch};
use super::strategy::{fold, MatchStrategy};
use crate::catalog::{Medicine, RecordStore, StoreError};
use crate::config::EngineConfig;
use crate::error::SearchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Ordered evaluation result, at most `limit` long
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub strategy: MatchStrategy,
    pub matches: Vec<ScoredMatch>,
}

impl ResultSet {
    pub fn empty(strategy: MatchStrategy) -> Self {
        Self {
            strategy,
            matches: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn records(&self) -> Vec<&Medicine> {
        self.matches.iter().map(|m| m.record.as_ref()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.record.name.clone()).collect()
    }
}

/// Optional deadline and caller-driven cancellation for one evaluation
#[derive(Debug, Default)]
pub struct CancelSignal {
    deadline: Option<Instant>,
    flag: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// Never fires
    pub fn none() -> Self {
        Self::default()
    }

    pub fn deadline_in(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            flag: None,
        }
    }

    /// Also fire when the watched flag becomes `true`
    pub fn with_flag(mut self, flag: watch::Receiver<bool>) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Resolves with a reason once the signal fires
    async fn fired(&mut self) -> &'static str {
        let deadline = self.deadline;
        let until_deadline = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        let until_flag = async {
            match self.flag.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    // A dropped sender can no longer cancel
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = until_flag => "cancelled by caller",
            _ = until_deadline => "deadline exceeded",
        }
    }
}

/// Stateless evaluator over a record store
pub struct SearchEngine {
    store: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Evaluate without a deadline
    pub async fn evaluate(&self, query: &Query) -> Result<ResultSet, SearchError> {
        self.evaluate_with(query, CancelSignal::none()).await
    }

    /// Evaluate, aborting the store read if `cancel` fires first.
    /// Partial results are never returned.
    pub async fn evaluate_with(
        &self,
        query: &Query,
        mut cancel: CancelSignal,
    ) -> Result<ResultSet, SearchError> {
        let resolved = query.resolve(&self.config)?;
        if resolved.text.is_empty() {
            return Ok(ResultSet::empty(resolved.strategy));
        }

        let started = Instant::now();
        let matches = tokio::select! {
            biased;
            reason = cancel.fired() => {
                debug!(strategy = %resolved.strategy, "Evaluation cancelled: {}", reason);
                return Err(SearchError::Cancelled(reason.to_string()));
            }
            result = self.gather(&resolved) => result?,
        };

        let candidates = matches.len();
        let matches = rank_matches(matches, resolved.limit);

        debug!(
            strategy = %resolved.strategy,
            candidates,
            returned = matches.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Evaluated query '{}'",
            resolved.text
        );

        Ok(ResultSet {
            strategy: resolved.strategy,
            matches,
        })
    }

    /// The single store read for a strategy, keyed for ranking
    async fn gather(&self, query: &ResolvedQuery) -> Result<Vec<ScoredMatch>, StoreError> {
        let text = query.text.as_str();
        let scored = |pairs: Vec<(Arc<Medicine>, f64)>| -> Vec<ScoredMatch> {
            pairs
                .into_iter()
                .map(|(record, score)| {
                    let key = OrderingKey::scored(&record, score);
                    ScoredMatch::new(record, key)
                })
                .collect()
        };

        let matches = match query.strategy {
            MatchStrategy::Prefix => self
                .store
                .prefix_match(text)
                .await?
                .into_iter()
                .map(|record| {
                    let key = OrderingKey::prefix(&record);
                    ScoredMatch::new(record, key)
                })
                .collect(),
            MatchStrategy::Substring => scored(self.store.substring_match(text).await?),
            MatchStrategy::FullText => scored(self.store.full_text_match(text).await?),
            MatchStrategy::Fuzzy => scored(self.store.similar_match(text, query.threshold).await?),
            MatchStrategy::Unified => {
                let folded_query = fold(text);
                self.store
                    .unified_candidates(text, query.threshold)
                    .await?
                    .into_iter()
                    .map(|candidate| {
                        let key = OrderingKey::unified(&candidate, &folded_query, query.threshold);
                        ScoredMatch::new(candidate.record, key)
                    })
                    .collect()
            }
        };

        Ok(matches)
    }
}
