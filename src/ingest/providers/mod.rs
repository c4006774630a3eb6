// src/ingest/providers/mod.rs
pub mod external_rss;
pub mod nse_rss;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::normalize_text;
use crate::model::Item;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Parse one RSS document into rows for `source`. The raw `pubDate` string
/// is carried through untouched — date parsing belongs to the recency
/// filter, not here.
pub(crate) fn parse_rss_items(source: &str, xml: &str) -> Result<Vec<Item>> {
    let t0 = std::time::Instant::now();
    let rss: Rss = from_str(xml).with_context(|| format!("parsing {source} rss xml"))?;

    let fetched_at = Utc::now();
    let mut out = Vec::with_capacity(rss.channel.item.len());
    for entry in rss.channel.item {
        let title = normalize_text(entry.title.as_deref().unwrap_or_default());
        let link = entry.link.as_deref().unwrap_or_default().trim().to_string();
        let description = normalize_text(entry.description.as_deref().unwrap_or_default());
        if title.is_empty() && link.is_empty() && description.is_empty() {
            continue;
        }
        let published = entry
            .pub_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        out.push(Item {
            source: source.to_string(),
            published,
            title,
            link,
            description,
            fetched_at,
            extra: Vec::new(),
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    counter!("ingest_items_total").increment(out.len() as u64);
    Ok(out)
}
