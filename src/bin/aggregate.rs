//! One aggregation pass: fetch every configured feed, merge the groups,
//! dedupe against the persisted table, apply the recency window, persist.
//! With a roster configured, a batch search report is written afterwards
//! for the downstream renderer.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stock_feed_aggregator::ingest::{
    self, config,
    providers::{external_rss::ExternalRssProvider, nse_rss::NseRssProvider},
    FeedProvider,
};
use stock_feed_aggregator::report::{self, ExecutionMode};
use stock_feed_aggregator::search::MatchProfiles;
use stock_feed_aggregator::{pipeline, roster, store};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;

    let mut providers: Vec<Box<dyn FeedProvider>> = Vec::new();
    for url in &cfg.rss_urls {
        providers.push(Box::new(NseRssProvider::from_url(url)));
    }
    for (name, url) in &cfg.external_feeds {
        providers.push(Box::new(ExternalRssProvider::from_url(name, url)));
    }
    info!(feeds = providers.len(), "starting aggregation pass");

    let (groups, reports) = ingest::fetch_all(&providers).await;
    ingest::log_fetch_summary(&reports);

    let table_path = Path::new(&cfg.table_path);
    let existing = store::load_or_empty(table_path);
    let fetched: usize = groups.iter().map(|g| g.len()).sum();
    let prior = existing.len();

    let now = Utc::now();
    let table = pipeline::run(existing, groups, cfg.window_days, now);
    info!(
        fetched,
        prior,
        retained = table.len(),
        window_days = cfg.window_days,
        "pipeline complete"
    );

    // A locked/unwritable table must not kill the run; the in-memory result
    // is still good for the report below.
    if let Err(e) = store::save(table_path, &table) {
        error!(error = %e, "table not persisted; close any program holding it and re-run");
    } else {
        info!(path = %table_path.display(), "table persisted");
    }

    if let Ok(roster_path) = std::env::var("STOCK_ROSTER_PATH") {
        let roster_map = roster::load(Path::new(&roster_path))?;
        info!(symbols = roster_map.len(), "roster loaded, building report");

        let mode = ExecutionMode::detect();
        let rep = report::build_report(&table, &roster_map, &MatchProfiles::builtin(), mode, now);
        info!(total_matches = rep.total_matches, "batch search complete");

        let out = std::env::var("REPORT_PATH").unwrap_or_else(|_| "data/stock_matches.json".into());
        match serde_json::to_string_pretty(&rep) {
            Ok(body) => {
                if let Err(e) = std::fs::write(&out, body) {
                    warn!(error = %e, path = %out, "report not written");
                } else {
                    info!(path = %out, open_browser = rep.should_open_browser(), "report written");
                }
            }
            Err(e) => warn!(error = %e, "report not serializable"),
        }
    }

    Ok(())
}
