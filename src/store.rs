// src/store.rs
//! Persisted feed table.
//!
//! The dataset written at the end of an aggregate run is the baseline the
//! next run dedupes against. Saves go through a temp file + rename so a
//! reader never observes a half-written table.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::warn;

use crate::error::StoreError;
use crate::model::Dataset;

pub const DEFAULT_TABLE_PATH: &str = "data/feed_table.json";

/// Load the persisted table. A missing file is an empty dataset, not an
/// error — first runs have no prior state.
pub fn load(path: &Path) -> Result<Dataset, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Dataset::new()),
        Err(e) => {
            return Err(StoreError::PersistenceUnavailable {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    let mut ds: Dataset = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Column order is derived state; recompute rather than trust the file.
    ds.recompute_columns();
    Ok(ds)
}

/// Load, recovering from unavailable or corrupt prior state by treating it
/// as empty. The failure is reported, never fatal.
pub fn load_or_empty(path: &Path) -> Dataset {
    match load(path) {
        Ok(ds) => ds,
        Err(e) => {
            warn!(error = %e, "prior table unusable, starting from empty");
            Dataset::new()
        }
    }
}

/// Save the table. Failure (e.g. the target locked by another process) is
/// returned to the caller to report and retry; the in-memory dataset remains
/// valid regardless.
pub fn save(path: &Path, dataset: &Dataset) -> Result<(), StoreError> {
    let unavailable = |source: std::io::Error| StoreError::PersistenceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }
    }

    let body = serde_json::to_string_pretty(dataset).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(unavailable)?;
    fs::rename(&tmp, path).map_err(unavailable)?;
    Ok(())
}

/// Modification time of the persisted table, used for cache invalidation.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
