// src/ingest/providers/external_rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::ingest::providers::parse_rss_items;
use crate::ingest::FeedProvider;
use crate::model::Item;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// A named external feed (BSE, news portals, ...). Unlike the exchange
/// archive feeds, the source name is configured, not derived from the URL.
pub struct ExternalRssProvider {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl ExternalRssProvider {
    pub fn from_url(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: url.to_string(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }
}

#[async_trait]
impl FeedProvider for ExternalRssProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        match &self.mode {
            Mode::Fixture(xml) => parse_rss_items(&self.name, xml),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .header(reqwest::header::USER_AGENT, USER_AGENT)
                    .send()
                    .await;
                let body = match resp.and_then(|r| r.error_for_status()) {
                    Ok(r) => r.text().await.context("external feed .text()")?,
                    Err(e) => {
                        counter!("ingest_provider_errors_total").increment(1);
                        return Err(e).with_context(|| format!("{} http get()", self.name));
                    }
                };
                parse_rss_items(&self.name, &body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_without_pubdate_yields_none() {
        let xml = r#"<rss version="2.0"><channel>
<item>
  <title>Scrip 500325 corporate update</title>
  <link>https://bse.test/ann/9</link>
  <description>Record date 14/08/2026</description>
</item>
</channel></rss>"#;
        let p = ExternalRssProvider::from_fixture("BSE", xml);
        let items = p.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "BSE");
        assert_eq!(items[0].published, None);
        assert_eq!(items[0].description, "Record date 14/08/2026");
    }
}
