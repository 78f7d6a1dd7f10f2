//! Query evaluation and ranking
//!
//! - [`strategy`]: the closed strategy set and match predicates
//! - [`trigram`], [`fulltext`]: similarity and text-rank primitives
//! - [`ranking`]: typed lexicographic ordering keys
//! - [`engine`]: the evaluator owning the public contract

pub mod engine;
pub mod fulltext;
pub mod query;
pub mod ranking;
pub mod strategy;
pub mod trigram;


pub use engine::{CancelSignal, ResultSet, SearchEngine};
pub use query::{Query, SearchParams};
pub use strategy::MatchStrategy;
