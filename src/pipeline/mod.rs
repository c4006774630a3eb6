// src/pipeline/mod.rs
//! The aggregation pipeline: merge → dedupe → recency filter.
//!
//! Every step is synchronous, pure data-in/data-out, and only ever selects
//! or drops rows — field values are never mutated here.

pub mod dates;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::model::{Dataset, Item};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_merged_total", "Rows entering the pipeline after merge.");
        describe_counter!("pipeline_dedup_total", "Rows removed as duplicate links.");
        describe_counter!("pipeline_expired_total", "Rows dropped by the recency window.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Concatenate per-source groups into one table, preserving relative order
/// within each group and group order as supplied. Purely structural: no row
/// is dropped or altered, rows with a missing link ride through with an
/// empty one.
pub fn merge(groups: Vec<Dataset>) -> Dataset {
    let mut items = Vec::with_capacity(groups.iter().map(Dataset::len).sum());
    for group in groups {
        items.extend(group.items);
    }
    Dataset::from_items(items)
}

/// Union of `existing` and `incoming` with duplicate links removed.
///
/// Two rows are duplicates iff their links are equal and non-empty. The row
/// already in `existing` wins, which preserves enrichment or manual edits
/// made to historical rows. Result order: all of `existing`, then the
/// surviving `incoming` rows, both in their original order.
pub fn dedupe(existing: Dataset, incoming: Dataset) -> Dataset {
    ensure_metrics_described();

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::with_capacity(existing.len() + incoming.len());
    let mut dropped = 0usize;

    for item in existing.items.into_iter().chain(incoming.items) {
        if !item.link.is_empty() && !seen.insert(item.link.clone()) {
            dropped += 1;
            continue;
        }
        items.push(item);
    }

    counter!("pipeline_dedup_total").increment(dropped as u64);
    Dataset::from_items(items)
}

/// Keep rows whose resolved date lies inside the trailing window, anchored
/// at `now` and compared at day granularity. The boundary is inclusive: a
/// row dated exactly `window_days` ago stays.
///
/// Rows with no resolvable date are always retained — precision is traded
/// for recall, since dropping a genuinely recent but unparsable item is
/// worse than showing a stale one. Relative order of retained rows is
/// preserved.
pub fn filter_recent(rows: Dataset, window_days: i64, now: DateTime<Utc>) -> Dataset {
    ensure_metrics_described();

    let cutoff = now.date_naive() - Duration::days(window_days);
    let mut expired = 0usize;

    let items: Vec<Item> = rows
        .items
        .into_iter()
        .filter(|item| match dates::resolve_item_date(item) {
            Some(d) => {
                let keep = d >= cutoff;
                if !keep {
                    expired += 1;
                }
                keep
            }
            // Kept-by-fallback: no resolvable date.
            None => true,
        })
        .collect();

    counter!("pipeline_expired_total").increment(expired as u64);
    gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);
    Dataset::from_items(items)
}

/// Full pipeline pass over freshly fetched groups against persisted state.
pub fn run(
    existing: Dataset,
    groups: Vec<Dataset>,
    window_days: i64,
    now: DateTime<Utc>,
) -> Dataset {
    ensure_metrics_described();

    let merged = merge(groups);
    counter!("pipeline_merged_total").increment(merged.len() as u64);

    let combined = dedupe(existing, merged);
    filter_recent(combined, window_days, now)
}
