// tests/e2e_pipeline.rs
//
// Full pass over canned feeds: fixture providers → merge → dedupe against
// prior state → recency window → persist → search.

use chrono::{Duration, TimeZone, Utc};
use stock_feed_aggregator::ingest::{
    self,
    providers::{external_rss::ExternalRssProvider, nse_rss::NseRssProvider},
    FeedProvider, FetchStatus,
};
use stock_feed_aggregator::model::{Dataset, Item};
use stock_feed_aggregator::roster::StockRoster;
use stock_feed_aggregator::search::{self, MatchProfiles};
use stock_feed_aggregator::{pipeline, store};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
}

fn item(source: &str, link: &str, days_ago: i64) -> Item {
    let d = now() - Duration::days(days_ago);
    Item {
        source: source.to_string(),
        published: Some(d.format("%d-%b-%Y %H:%M:%S").to_string()),
        title: format!("announcement {link}"),
        link: link.to_string(),
        description: String::new(),
        fetched_at: now(),
        extra: Vec::new(),
    }
}

#[test]
fn dedupe_then_filter_keeps_exactly_one() {
    // Two copies of link "a" five days old, link "b" forty days old.
    let groups = vec![
        Dataset::from_items(vec![item("NSE", "a", 5), item("NSE", "a", 5)]),
        Dataset::from_items(vec![item("BSE", "b", 40)]),
    ];
    let out = pipeline::run(Dataset::new(), groups, 30, now());
    assert_eq!(out.len(), 1);
    assert_eq!(out.items[0].link, "a");
}

#[tokio::test]
async fn fixture_feeds_flow_through_to_search() {
    let nse_xml = std::fs::read_to_string("tests/fixtures/nse_rss.xml").unwrap();
    let bse_xml = std::fs::read_to_string("tests/fixtures/bse_rss.xml").unwrap();

    let providers: Vec<Box<dyn FeedProvider>> = vec![
        Box::new(NseRssProvider::from_fixture("Online_announcements", &nse_xml)),
        Box::new(ExternalRssProvider::from_fixture("BSE", &bse_xml)),
    ];

    let (groups, reports) = ingest::fetch_all(&providers).await;
    assert_eq!(groups.len(), 2);
    assert!(reports.iter().all(|r| r.status == FetchStatus::Ok));

    // Persist, reload, and run a second pass: dedup must hold the line.
    let dir = tempfile::tempdir().unwrap();
    let table_path = dir.path().join("feed_table.json");

    let first = pipeline::run(Dataset::new(), groups.clone(), 3650, now());
    store::save(&table_path, &first).unwrap();

    let prior = store::load(&table_path).unwrap();
    let second = pipeline::run(prior, groups, 3650, now());
    assert_eq!(second.len(), first.len(), "re-fetching the same feeds adds nothing");

    let roster = StockRoster::from_pairs([("RELIANCE", "Reliance Industries Limited")]);
    let r = search::search(&second, &roster, &MatchProfiles::builtin(), "reliance").unwrap();
    assert_eq!(r.symbol, "RELIANCE");
    assert_eq!(r.matches.len(), 1);
    assert_eq!(r.matches[0].item.source, "Online_announcements");
}
