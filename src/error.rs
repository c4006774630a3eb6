// src/error.rs
//! Error taxonomy for the query and persistence surfaces.
//!
//! Malformed rows are not represented here: a missing field is tolerated by
//! substituting an empty value at the row-model level, never raised. Fetch
//! errors stay inside the ingest layer and reach the pipeline only as an
//! error status for that source.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the search/query surface. Returned to callers, never fatal.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Empty or otherwise malformed search input. Surfaced to the caller,
    /// not retried.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No dataset is available to search. Distinguishable from "no matches"
    /// so UI callers can tell "system not ready" apart from an empty result.
    #[error("no dataset available: {0}")]
    DataUnavailable(String),
}

/// Failures of the persisted-table layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Load/save failed (file locked, disk gone, ...). On load the caller
    /// recovers by treating prior state as empty; on save it reports and may
    /// retry. The in-memory dataset stays valid either way.
    #[error("persistence unavailable at {}: {source}", path.display())]
    PersistenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted table exists but cannot be decoded.
    #[error("persisted table at {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
