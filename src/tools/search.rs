//! Search tool implementation
//!
//! Runs one query from the command line and renders the records as
//! markdown or JSON

use crate::catalog::{Medicine, RecordStore};
use crate::cli::SearchArgs;
use crate::config::Config;
use crate::search::{CancelSignal, MatchStrategy, Query, ResultSet, SearchEngine};
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use super::util::{load_engine, resolve_data_dir};

/// Execute the search command
pub async fn execute_search(args: SearchArgs, config: &Config) -> Result<String> {
    // Reject a bad strategy before paying for the import
    let strategy: MatchStrategy = args.strategy.parse()?;
    let dir = resolve_data_dir(args.data.as_deref(), config);
    let engine = load_engine(&dir, config)?;
    run_search(&engine, &args, strategy, config).await
}

pub(crate) async fn run_search(
    engine: &SearchEngine,
    args: &SearchArgs,
    strategy: MatchStrategy,
    config: &Config,
) -> Result<String> {
    let mut query = Query::new(args.query.clone(), strategy);
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    if let Some(threshold) = args.threshold {
        query = query.with_threshold(threshold);
    }

    let cancel = CancelSignal::deadline_in(Duration::from_millis(config.server.request_timeout_ms));
    let result = engine.evaluate_with(&query, cancel).await?;
    debug!("{} results for '{}'", result.len(), args.query);

    if args.json {
        Ok(serde_json::to_string_pretty(&result.records())?)
    } else {
        Ok(format_search_results(&result, &args.query, &**engine.store()))
    }
}

/// Format results as markdown, with each name's similarity to the query
pub fn format_search_results(result: &ResultSet, query: &str, store: &dyn RecordStore) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "# Search Results · {} {} · `{}`\n\n",
        result.len(),
        if result.len() == 1 { "medicine" } else { "medicines" },
        result.strategy
    ));

    if result.is_empty() {
        if query.trim().is_empty() {
            md.push_str("_Empty query._\n");
        } else {
            md.push_str(&format!("No medicines match '{}'.\n", query.trim()));
        }
        return md;
    }

    for (i, record) in result.records().into_iter().enumerate() {
        md.push_str(&format!("{}. **{}** ({})\n", i + 1, record.name, record.id));
        for line in detail_lines(record) {
            md.push_str(&format!("   - {}\n", line));
        }
        md.push_str(&format!(
            "   - Similarity: {:.2}\n",
            store.similarity(query.trim(), &record.name)
        ));
    }
    md
}

fn detail_lines(record: &Medicine) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(manufacturer) = &record.manufacturer_name {
        lines.push(format!("Manufacturer: {}", manufacturer));
    }
    if let Some(composition) = &record.short_composition {
        lines.push(format!("Composition: {}", composition));
    }
    if let Some(pack) = &record.pack_size_label {
        lines.push(format!("Pack: {}", pack));
    }
    if let Some(price) = record.price {
        lines.push(format!("Price: {:.2}", price));
    }
    if record.is_discontinued {
        lines.push("Discontinued".to_string());
    } else if !record.available {
        lines.push("Unavailable".to_string());
    }
    lines
}
