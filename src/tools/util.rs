//! Utility functions for tools

use crate::catalog::import::{load_dir, ImportSummary};
use crate::catalog::MemoryStore;
use crate::config::Config;
use crate::search::SearchEngine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Used when neither the flag, the environment nor the config names one
pub const DEFAULT_DATA_DIR: &str = "dataset";

/// CLI flag or env, then config file, then the default
pub fn resolve_data_dir(flag: Option<&Path>, config: &Config) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Load a data directory, logging the import summary
pub fn import(dir: &Path) -> Result<ImportSummary> {
    let summary = load_dir(dir)
        .with_context(|| format!("Failed to load catalog from {}", dir.display()))?;
    info!(
        files = summary.files,
        records = summary.records.len(),
        skipped = summary.skipped,
        duplicates = summary.duplicates,
        "Loaded catalog from {}",
        dir.display()
    );
    Ok(summary)
}

/// Build an engine over the records in `dir`
pub fn load_engine(dir: &Path, config: &Config) -> Result<SearchEngine> {
    let summary = import(dir)?;
    let store = MemoryStore::new(summary.records);
    Ok(SearchEngine::new(Arc::new(store), config.engine.clone()))
}
