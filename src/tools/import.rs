//! Import tool implementation

use crate::cli::ImportArgs;
use crate::config::Config;
use anyhow::Result;

use super::util::{import, resolve_data_dir};

/// Load a data directory and summarize what would be indexed
pub fn execute_import(args: ImportArgs, config: &Config) -> Result<String> {
    let dir = resolve_data_dir(args.data.as_deref(), config);
    let summary = import(&dir)?;
    Ok(format!(
        "Imported {} records from {} files in {} ({} skipped without id, {} duplicate ids)",
        summary.records.len(),
        summary.files,
        dir.display(),
        summary.skipped,
        summary.duplicates
    ))
}
