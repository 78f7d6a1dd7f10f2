//! Error types for the search engine
//!
//! Every failure leaves the evaluator as a typed [`SearchError`]. Empty
//! queries and queries with no matches are not errors.

use crate::catalog::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Bad limit, threshold or strategy. Raised before any store access.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Transient backend failure, not retried here
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// Deadline or cancellation fired before the store read completed
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl SearchError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::InvalidArgument(_) => "invalid_argument",
            SearchError::Store(_) => "store_error",
            SearchError::Cancelled(_) => "cancelled",
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            SearchError::InvalidArgument(_) => 1,
            SearchError::Store(_) => 2,
            SearchError::Cancelled(_) => 4,
        }
    }

    /// HTTP status class at the API boundary
    pub fn http_status(&self) -> u16 {
        match self {
            SearchError::InvalidArgument(_) => 400,
            SearchError::Store(_) => 503,
            SearchError::Cancelled(_) => 504,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.error_code().to_string(),
            message: self.message(),
        }
    }
}

/// JSON error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::InvalidArgument("limit must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid argument: limit must be positive");

        let err = SearchError::from(StoreError::Unavailable("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            "Store error: store unavailable: connection refused"
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            SearchError::InvalidArgument(String::new()),
            SearchError::Store(StoreError::Query(String::new())),
            SearchError::Cancelled(String::new()),
        ];
        let codes: Vec<&str> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes, vec!["invalid_argument", "store_error", "cancelled"]);
        assert_eq!(errors[2].exit_code(), 4);
    }
}
