// tests/pipeline_merge.rs
use chrono::{TimeZone, Utc};
use stock_feed_aggregator::model::{Dataset, Item, CANONICAL_COLUMNS};
use stock_feed_aggregator::pipeline;

fn item(source: &str, link: &str, extra: &[(&str, &str)]) -> Item {
    Item {
        source: source.to_string(),
        published: None,
        title: "t".into(),
        link: link.to_string(),
        description: "d".into(),
        fetched_at: Utc.with_ymd_and_hms(2026, 8, 5, 8, 0, 0).unwrap(),
        extra: extra
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[test]
fn canonical_prefix_regardless_of_group_order() {
    let nse = Dataset::from_items(vec![item("NSE", "a", &[("attachment", "x.pdf")])]);
    let bse = Dataset::from_items(vec![item("BSE", "b", &[("isin", "INE0X")])]);

    for groups in [vec![nse.clone(), bse.clone()], vec![bse, nse]] {
        let out = pipeline::merge(groups);
        assert_eq!(&out.columns[..6], &CANONICAL_COLUMNS.map(String::from));
    }
}

#[test]
fn extra_columns_appear_in_first_seen_order() {
    let g1 = Dataset::from_items(vec![item("NSE", "a", &[("symbol", "X"), ("isin", "I1")])]);
    let g2 = Dataset::from_items(vec![item("BSE", "b", &[("isin", "I2"), ("xbrl_link", "u")])]);
    let out = pipeline::merge(vec![g1, g2]);
    assert_eq!(
        out.columns[6..],
        ["symbol", "isin", "xbrl_link"].map(String::from)
    );
}

#[test]
fn merge_drops_and_alters_nothing() {
    let g1 = Dataset::from_items(vec![item("NSE", "a", &[]), item("NSE", "", &[])]);
    let g2 = Dataset::from_items(vec![item("BSE", "a", &[])]);
    let out = pipeline::merge(vec![g1, g2]);
    // Same link twice and a missing link all ride through; dedup is not
    // merge's concern.
    assert_eq!(out.len(), 3);
    let links: Vec<&str> = out.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, ["a", "", "a"]);
}
