// src/api.rs
//! Query server adapter: a thin HTTP wrapper over the search engine.
//!
//! The persisted table is cached behind an `RwLock` and revalidated against
//! the file's mtime on every request, so staleness is bounded by one request
//! and readers never observe a half-swapped dataset.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::error::QueryError;
use crate::model::Dataset;
use crate::roster::{self, StockRoster};
use crate::search::{self, MatchProfiles, StockMatch};
use crate::store;

struct CacheSlot {
    mtime: SystemTime,
    dataset: Arc<Dataset>,
    roster: Arc<StockRoster>,
}

struct StateInner {
    table_path: PathBuf,
    roster_path: Option<PathBuf>,
    profiles: MatchProfiles,
    cache: RwLock<Option<CacheSlot>>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

impl AppState {
    pub fn new(table_path: PathBuf, roster_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StateInner {
                table_path,
                roster_path,
                profiles: MatchProfiles::builtin(),
                cache: RwLock::new(None),
            }),
        }
    }

    /// Paths from `FEED_TABLE_PATH` / `STOCK_ROSTER_PATH`, falling back to
    /// the default table location.
    pub fn from_env() -> Self {
        let table = std::env::var("FEED_TABLE_PATH")
            .unwrap_or_else(|_| store::DEFAULT_TABLE_PATH.to_string());
        let roster_path = std::env::var("STOCK_ROSTER_PATH").ok().map(PathBuf::from);
        Self::new(PathBuf::from(table), roster_path)
    }

    /// Current table + roster, revalidated by mtime. The swap is atomic:
    /// a fresh slot is built fully, then installed under the write lock.
    fn snapshot(&self) -> Result<(Arc<Dataset>, Arc<StockRoster>), QueryError> {
        let inner = &self.inner;
        let mtime = store::mtime(&inner.table_path).ok_or_else(|| {
            QueryError::DataUnavailable(format!(
                "no aggregated table at {}",
                inner.table_path.display()
            ))
        })?;

        if let Ok(guard) = inner.cache.read() {
            if let Some(slot) = guard.as_ref() {
                if slot.mtime == mtime {
                    return Ok((slot.dataset.clone(), slot.roster.clone()));
                }
            }
        }

        let dataset = store::load(&inner.table_path)
            .map_err(|e| QueryError::DataUnavailable(e.to_string()))?;
        let roster_map = match &inner.roster_path {
            Some(p) => match roster::load(p) {
                Ok(r) => r,
                Err(e) => {
                    // Searches still work symbol-only without a roster.
                    warn!(error = %e, "roster unavailable, serving symbol-only matches");
                    StockRoster::default()
                }
            },
            None => StockRoster::default(),
        };

        let dataset = Arc::new(dataset);
        let roster_map = Arc::new(roster_map);
        if let Ok(mut guard) = inner.cache.write() {
            *guard = Some(CacheSlot {
                mtime,
                dataset: dataset.clone(),
                roster: roster_map.clone(),
            });
        }
        Ok((dataset, roster_map))
    }

    fn invalidate(&self) {
        if let Ok(mut guard) = self.inner.cache.write() {
            *guard = None;
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/admin/reload", get(admin_reload))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct SearchParams {
    #[serde(default)]
    symbol: String,
}

/// Flatten a match to the wire shape: canonical fields, extras, and the
/// matched keyword for highlighting.
fn match_to_json(m: &StockMatch) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("source".into(), json!(m.item.source));
    obj.insert("published".into(), json!(m.item.published));
    obj.insert("title".into(), json!(m.item.title));
    obj.insert("link".into(), json!(m.item.link));
    obj.insert("description".into(), json!(m.item.description));
    obj.insert("fetchedAt".into(), json!(m.item.fetched_at.to_rfc3339()));
    for (k, v) in &m.item.extra {
        obj.insert(k.clone(), json!(v));
    }
    obj.insert("matchedKeyword".into(), json!(m.matched_keyword));
    serde_json::Value::Object(obj)
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let (dataset, roster_map) = match state.snapshot() {
        Ok(pair) => pair,
        Err(QueryError::DataUnavailable(msg)) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": msg })),
            )
                .into_response();
        }
        Err(QueryError::InvalidQuery(msg)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "invalid_query", "error": msg })),
            )
                .into_response();
        }
    };

    match search::search(&dataset, &roster_map, &state.inner.profiles, &params.symbol) {
        Ok(result) => {
            let mut body = json!({
                "status": "ok",
                "symbol": result.symbol,
                "matches": result.matches.iter().map(match_to_json).collect::<Vec<_>>(),
            });
            // Unknown symbol with nothing found: offer near-miss roster hits.
            if result.matches.is_empty() && !roster_map.contains(&result.symbol) {
                let hints = roster_map.closest_symbols(&result.symbol, 3);
                if !hints.is_empty() {
                    body["didYouMean"] = json!(hints);
                }
            }
            Json(body).into_response()
        }
        Err(QueryError::InvalidQuery(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "invalid_query", "error": msg })),
        )
            .into_response(),
        Err(QueryError::DataUnavailable(msg)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": msg })),
        )
            .into_response(),
    }
}

async fn admin_reload(State(state): State<AppState>) -> &'static str {
    state.invalidate();
    "reloaded"
}
