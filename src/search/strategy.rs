//! Match strategies
//!
//! The strategy tag is parsed once at the API boundary into [`MatchStrategy`];
//! nothing below that boundary compares strategy strings. The predicate
//! functions here are the single definition of what "matches" means for each
//! strategy, shared by the store backends and the tests.

use crate::error::SearchError;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Closed set of strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    Prefix,
    Substring,
    FullText,
    Fuzzy,
    Unified,
}

impl MatchStrategy {
    pub const ALL: [MatchStrategy; 5] = [
        MatchStrategy::Prefix,
        MatchStrategy::Substring,
        MatchStrategy::FullText,
        MatchStrategy::Fuzzy,
        MatchStrategy::Unified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Prefix => "prefix",
            MatchStrategy::Substring => "substring",
            MatchStrategy::FullText => "fulltext",
            MatchStrategy::Fuzzy => "fuzzy",
            MatchStrategy::Unified => "unified",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(MatchStrategy::Prefix),
            "substring" => Ok(MatchStrategy::Substring),
            "fulltext" | "full_text" => Ok(MatchStrategy::FullText),
            "fuzzy" => Ok(MatchStrategy::Fuzzy),
            "unified" => Ok(MatchStrategy::Unified),
            other => Err(SearchError::InvalidArgument(format!(
                "unknown strategy '{}', expected one of {}",
                other,
                MatchStrategy::ALL.map(|s| s.as_str()).join(", ")
            ))),
        }
    }
}

/// Case-fold for comparison: NFKC then lowercase
pub fn fold(text: &str) -> String {
    text.nfkc().flat_map(char::to_lowercase).collect()
}

/// `prefix`: folded name starts with folded query
pub fn prefix_matches(folded_query: &str, folded_name: &str) -> bool {
    folded_name.starts_with(folded_query)
}

/// `substring`: folded name contains folded query
pub fn substring_matches(folded_query: &str, folded_name: &str) -> bool {
    folded_name.contains(folded_query)
}

/// `fuzzy`: similarity clears the threshold (inclusive)
pub fn fuzzy_matches(similarity: f64, threshold: f64) -> bool {
    similarity >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for strategy in MatchStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<MatchStrategy>().unwrap(), strategy);
        }
        assert_eq!("FullText".parse::<MatchStrategy>().unwrap(), MatchStrategy::FullText);
    }

    #[test]
    fn test_parse_unknown_is_invalid_argument() {
        let err = "regex".parse::<MatchStrategy>().unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[test]
    fn test_fold_is_case_insensitive() {
        assert_eq!(fold("AVASTIN Forte"), "avastin forte");
        // Fullwidth letters fold to ASCII under NFKC
        assert_eq!(fold("ＡＢＣ"), "abc");
    }

    #[test]
    fn test_predicates() {
        assert!(prefix_matches("ava", "avastin"));
        assert!(!prefix_matches("stin", "avastin"));
        assert!(substring_matches("stin", "avastin"));
        assert!(!substring_matches("xyz", "avastin"));
    }

    #[test]
    fn test_fuzzy_threshold_is_inclusive() {
        assert!(fuzzy_matches(0.3, 0.3));
        assert!(!fuzzy_matches(0.2999, 0.3));
    }
}
