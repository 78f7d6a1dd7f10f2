//! Catalog import from a directory of JSON files
//!
//! Each `*.json` file holds an array of record objects. Files are read in
//! file-name order. Records without an id are skipped; a repeated id keeps
//! the first record seen.

use super::record::Medicine;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("path {0} does not exist")]
    MissingPath(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} must contain a JSON array of records")]
    NotAnArray(PathBuf),
}

/// Outcome of loading a data directory
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub files: usize,
    pub records: Vec<Medicine>,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Load every JSON file in `path`
pub fn load_dir(path: &Path) -> Result<ImportSummary, ImportError> {
    if !path.exists() {
        return Err(ImportError::MissingPath(path.to_path_buf()));
    }

    let io_err = |source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    info!("Found {} JSON files in {}", files.len(), path.display());

    let mut summary = ImportSummary {
        files: files.len(),
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    for file in &files {
        let before = summary.records.len();
        load_file(file, &mut seen, &mut summary)?;
        info!(
            "Imported {} records from {}",
            summary.records.len() - before,
            file.display()
        );
    }

    if summary.skipped > 0 || summary.duplicates > 0 {
        warn!(
            "Import skipped {} records without a usable id and {} duplicate ids",
            summary.skipped, summary.duplicates
        );
    }

    Ok(summary)
}

fn load_file(
    file: &Path,
    seen: &mut HashSet<String>,
    summary: &mut ImportSummary,
) -> Result<(), ImportError> {
    let data = fs::read_to_string(file).map_err(|source| ImportError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&data).map_err(|source| ImportError::Parse {
        path: file.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = doc else {
        return Err(ImportError::NotAnArray(file.to_path_buf()));
    };

    for item in items {
        let id = match item.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                summary.skipped += 1;
                continue;
            }
        };

        if seen.contains(&id) {
            summary.duplicates += 1;
            continue;
        }

        let mut item = item;
        if let Value::Object(map) = &mut item {
            map.insert("id".to_string(), Value::String(id.clone()));
        }

        match serde_json::from_value::<Medicine>(item) {
            Ok(record) => {
                seen.insert(id);
                summary.records.push(record);
            }
            Err(e) => {
                warn!("Skipping record {} in {}: {}", id, file.display(), e);
                summary.skipped += 1;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: serde_json::Value) {
        fs::write(dir.path().join(name), serde_json::to_string(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let err = load_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ImportError::MissingPath(_)));
    }

    #[test]
    fn test_loads_files_in_name_order_and_keeps_first_duplicate() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "b.json",
            json!([{ "id": "1", "name": "Later" }, { "id": "2", "name": "Crocin" }]),
        );
        write(&dir, "a.json", json!([{ "id": "1", "name": "Avastin", "price": "100.5" }]));
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let summary = load_dir(dir.path()).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.duplicates, 1);
        let names: Vec<&str> = summary.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Avastin", "Crocin"]);
        assert_eq!(summary.records[0].price, Some(100.5));
    }

    #[test]
    fn test_skips_records_without_id_and_accepts_numeric_ids() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "data.json",
            json!([
                { "name": "No id" },
                { "id": "", "name": "Blank" },
                { "id": 42, "name": "Numeric" },
            ]),
        );
        let summary = load_dir(dir.path()).unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].id, "42");
    }

    #[test]
    fn test_rejects_non_array_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "data.json", json!({ "id": "1" }));
        assert!(matches!(
            load_dir(dir.path()).unwrap_err(),
            ImportError::NotAnArray(_)
        ));
    }
}
