// src/ingest/mod.rs
pub mod config;
pub mod providers;

use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::model::{Dataset, Item};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Total items parsed from providers.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_parse_ms", "Provider parse time in milliseconds.");
    });
}

/// Per-source fetch outcome, reported alongside the rows.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum FetchStatus {
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FetchReport {
    pub source: String,
    pub entries: usize,
    pub status: FetchStatus,
}

/// A feed source. Implementations fetch and fully materialize their rows;
/// the pipeline never consumes partial results.
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_latest(&self) -> anyhow::Result<Vec<Item>>;
    fn name(&self) -> &str;
}

/// Normalize feed text: entity-decode, strip tags, collapse whitespace.
/// Dates embedded in descriptions must survive, so nothing beyond that.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetch every provider, one group of rows per source. A provider failure
/// becomes an error report for that source — the other sources proceed and
/// the failed source simply contributes no group.
pub async fn fetch_all(
    providers: &[Box<dyn FeedProvider>],
) -> (Vec<Dataset>, Vec<FetchReport>) {
    ensure_metrics_described();

    let mut groups = Vec::with_capacity(providers.len());
    let mut reports = Vec::with_capacity(providers.len());

    for p in providers {
        match p.fetch_latest().await {
            Ok(items) => {
                counter!("ingest_items_total").increment(items.len() as u64);
                reports.push(FetchReport {
                    source: p.name().to_string(),
                    entries: items.len(),
                    status: FetchStatus::Ok,
                });
                groups.push(Dataset::from_items(items));
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                reports.push(FetchReport {
                    source: p.name().to_string(),
                    entries: 0,
                    status: FetchStatus::Error(format!("{e:#}")),
                });
            }
        }
    }

    (groups, reports)
}

/// Log the per-source summary of an aggregate run.
pub fn log_fetch_summary(reports: &[FetchReport]) {
    let ok = reports
        .iter()
        .filter(|r| r.status == FetchStatus::Ok)
        .count();
    for r in reports {
        match &r.status {
            FetchStatus::Ok => {
                tracing::info!(target: "ingest", source = %r.source, entries = r.entries, "feed ok")
            }
            FetchStatus::Error(msg) => {
                tracing::warn!(target: "ingest", source = %r.source, error = %msg, "feed failed")
            }
        }
    }
    tracing::info!(target: "ingest", feeds = reports.len(), ok, "fetch summary");
}
