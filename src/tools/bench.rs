//! Benchmark runner
//!
//! Replays a query file against the engine, one query at a time, and writes
//! `{"results": {id: [name, ...]}}` plus a `{id: ms}` timing sidecar. Both
//! maps keep input order.

use crate::cli::BenchArgs;
use crate::config::Config;
use crate::error::SearchError;
use crate::search::{MatchStrategy, Query, SearchEngine};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::util::{load_engine, resolve_data_dir};

/// Strategy for items that do not name one
pub const DEFAULT_STRATEGY: MatchStrategy = MatchStrategy::Substring;

/// One benchmark query as read from the input file
#[derive(Debug, Clone, PartialEq)]
pub struct BenchItem {
    pub id: String,
    pub query: String,
    pub kind: Option<String>,
    pub threshold: Option<Value>,
}

impl BenchItem {
    fn from_value(value: &Value, position: usize) -> Self {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => position.to_string(),
        };
        let query = value
            .get("query")
            .or_else(|| value.get("q"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        let threshold = value.get("threshold").filter(|v| !v.is_null()).cloned();

        Self {
            id,
            query,
            kind,
            threshold,
        }
    }

    /// Build the engine query, rejecting unknown types and bad thresholds
    pub fn to_query(&self, limit: usize) -> Result<Query, SearchError> {
        let strategy = match self.kind.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_STRATEGY,
            Some(name) => name.parse()?,
        };

        let mut query = Query::new(self.query.clone(), strategy).with_limit(limit);
        if let Some(raw) = &self.threshold {
            let threshold = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .ok_or_else(|| SearchError::InvalidArgument(format!("invalid threshold: {}", raw)))?;
            query = query.with_threshold(threshold);
        }
        Ok(query)
    }
}

/// Read the item list from a benchmark document
///
/// Accepts a top-level array or an object with a `tests` or `queries` array.
pub fn parse_items(doc: &Value) -> Result<Vec<BenchItem>, SearchError> {
    let items = match doc {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("tests")
            .or_else(|| map.get("queries"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SearchError::InvalidArgument(
                    "benchmark file must contain a `tests` or `queries` array".to_string(),
                )
            })?,
        _ => {
            return Err(SearchError::InvalidArgument(
                "benchmark file must be an array or an object".to_string(),
            ))
        }
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| BenchItem::from_value(item, i + 1))
        .collect())
}

/// Claim `id`, or the first free `id_dupN`
pub fn disambiguate_id(id: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(id.to_string()) {
        return id.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}_dup{}", id, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Results and timings keyed by disambiguated id, in input order
#[derive(Debug, Default)]
pub struct BenchReport {
    pub results: Map<String, Value>,
    pub timings: Map<String, Value>,
    pub invalid: usize,
}

fn round_ms(elapsed: std::time::Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

/// Run every item in order. A store failure or cancellation aborts the run.
pub async fn run_benchmark(
    engine: &SearchEngine,
    items: &[BenchItem],
    limit: usize,
) -> Result<BenchReport, SearchError> {
    let mut report = BenchReport::default();
    let mut taken = HashSet::new();

    for item in items {
        let id = disambiguate_id(&item.id, &mut taken);

        let query = match item.to_query(limit) {
            Ok(q) => q,
            Err(e) => {
                warn!("Skipping benchmark item {}: {}", id, e);
                report.invalid += 1;
                report.results.insert(id, Value::Array(Vec::new()));
                continue;
            }
        };

        if item.query.trim().is_empty() {
            report.results.insert(id, Value::Array(Vec::new()));
            continue;
        }

        let started = Instant::now();
        let outcome = engine.evaluate(&query).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(result) => {
                let names = result.names().into_iter().map(Value::String).collect();
                report.results.insert(id.clone(), Value::Array(names));
                report.timings.insert(id, Value::from(round_ms(elapsed)));
            }
            Err(SearchError::InvalidArgument(msg)) => {
                warn!("Skipping benchmark item {}: {}", id, msg);
                report.invalid += 1;
                report.results.insert(id, Value::Array(Vec::new()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the submission and timing files
pub fn write_report(report: BenchReport, out: &Path, timings: &Path) -> Result<()> {
    let mut submission = Map::new();
    submission.insert("results".to_string(), Value::Object(report.results));
    write_json(out, &Value::Object(submission))?;
    write_json(timings, &Value::Object(report.timings))?;
    Ok(())
}

/// Execute the bench command
pub async fn execute_bench(args: BenchArgs, config: &Config) -> Result<String> {
    let text = fs::read_to_string(&args.queries)
        .with_context(|| format!("Failed to read benchmark file {}", args.queries.display()))?;
    let doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse benchmark file {}", args.queries.display()))?;
    let items = parse_items(&doc)?;

    let dir = resolve_data_dir(args.data.as_deref(), config);
    let engine = load_engine(&dir, config)?;

    info!("Running {} benchmark queries", items.len());
    let started = Instant::now();
    let report = run_benchmark(&engine, &items, args.limit).await?;
    let total_ms = round_ms(started.elapsed());

    let timed = report.timings.len();
    let invalid = report.invalid;
    debug!("Benchmark finished in {} ms", total_ms);
    write_report(report, &args.out, &args.timings)?;

    info!(
        "Wrote {} and {}",
        args.out.display(),
        args.timings.display()
    );
    Ok(format!(
        "Ran {} queries ({} timed, {} invalid) in {} ms\nResults: {}\nTimings: {}",
        items.len(),
        timed,
        invalid,
        total_ms,
        args.out.display(),
        args.timings.display()
    ))
}
