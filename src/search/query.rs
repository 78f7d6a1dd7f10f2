//! Query values and boundary parsing
//!
//! A [`Query`] is built per request and consumed by one evaluation.
//! [`SearchParams`] is the raw string form used by the HTTP layer; parsing it
//! turns every malformed value into `InvalidArgument`.

use super::strategy::MatchStrategy;
use crate::config::EngineConfig;
use crate::error::SearchError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub raw_text: String,
    pub strategy: MatchStrategy,
    /// `None` uses the engine default
    pub limit: Option<usize>,
    /// `None` uses the strategy default
    pub threshold: Option<f64>,
}

impl Query {
    pub fn new(raw_text: impl Into<String>, strategy: MatchStrategy) -> Self {
        Self {
            raw_text: raw_text.into(),
            strategy,
            limit: None,
            threshold: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Validate and fill defaults. Never touches the store.
    pub fn resolve(&self, config: &EngineConfig) -> Result<ResolvedQuery, SearchError> {
        let limit = self.limit.unwrap_or(config.default_limit);
        if limit == 0 {
            return Err(SearchError::InvalidArgument(
                "limit must be a positive integer".to_string(),
            ));
        }
        if limit > config.max_limit {
            return Err(SearchError::InvalidArgument(format!(
                "limit {} exceeds maximum {}",
                limit, config.max_limit
            )));
        }

        if let Some(t) = self.threshold {
            if !t.is_finite() || !(0.0..=1.0).contains(&t) {
                return Err(SearchError::InvalidArgument(format!(
                    "threshold must be within [0, 1], got {}",
                    t
                )));
            }
        }

        let threshold = self.threshold.unwrap_or(match self.strategy {
            MatchStrategy::Fuzzy => config.fuzzy_threshold,
            MatchStrategy::Unified => config.unified_floor,
            _ => 0.0,
        });

        Ok(ResolvedQuery {
            text: self.raw_text.trim().to_string(),
            strategy: self.strategy,
            limit,
            threshold,
        })
    }
}

/// A validated query with defaults applied and text trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub text: String,
    pub strategy: MatchStrategy,
    pub limit: usize,
    /// Fuzzy threshold, or the candidate floor for unified
    pub threshold: f64,
}

/// Raw request parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
    pub threshold: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl SearchParams {
    /// Strategy named by `type`, or `default` when absent
    pub fn strategy_or(&self, default: MatchStrategy) -> Result<MatchStrategy, SearchError> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(name) => name.parse(),
        }
    }

    pub fn into_query(self, strategy: MatchStrategy) -> Result<Query, SearchError> {
        let mut query = Query::new(self.q.unwrap_or_default(), strategy);

        if let Some(raw) = non_blank(self.limit.as_deref()) {
            let limit = raw.parse::<usize>().map_err(|_| {
                SearchError::InvalidArgument(format!(
                    "limit must be a positive integer, got '{}'",
                    raw
                ))
            })?;
            query = query.with_limit(limit);
        }

        if let Some(raw) = non_blank(self.threshold.as_deref()) {
            let threshold = raw.parse::<f64>().map_err(|_| {
                SearchError::InvalidArgument(format!("threshold must be a number, got '{}'", raw))
            })?;
            query = query.with_threshold(threshold);
        }

        Ok(query)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
