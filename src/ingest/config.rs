// src/ingest/config.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

const ENV_PATH: &str = "FEEDS_CONFIG_PATH";

fn default_window_days() -> i64 {
    10
}

fn default_table_path() -> String {
    crate::store::DEFAULT_TABLE_PATH.to_string()
}

/// Feed and pipeline configuration. TOML is the primary format, JSON is
/// accepted for replayed configs.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FeedsConfig {
    /// Trailing recency window, in days.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    /// Where the aggregated table is persisted.
    #[serde(default = "default_table_path")]
    pub table_path: String,
    /// Exchange RSS endpoints; the source name is derived from the URL's
    /// file stem (`.../Online_announcements.xml` → `Online_announcements`).
    #[serde(default)]
    pub rss_urls: Vec<String>,
    /// Named external feeds (BSE, news portals, ...), name → URL.
    #[serde(default)]
    pub external_feeds: BTreeMap<String, String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            table_path: default_table_path(),
            rss_urls: Vec::new(),
            external_feeds: BTreeMap::new(),
        }
    }
}

/// Load configuration from an explicit path. Format by extension.
pub fn load_from(path: &Path) -> Result<FeedsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feeds config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "toml" => toml::from_str(&content).context("parsing TOML feeds config"),
        "json" => serde_json::from_str(&content).context("parsing JSON feeds config"),
        other => Err(anyhow!("unsupported feeds config format `.{other}`")),
    }
}

/// Load configuration using env var + fallbacks:
/// 1) $FEEDS_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in defaults (no feeds, 10-day window)
pub fn load_default() -> Result<FeedsConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("FEEDS_CONFIG_PATH points to non-existent path"));
    }
    for candidate in ["config/feeds.toml", "config/feeds.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_from(&p);
        }
    }
    Ok(FeedsConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_and_json_parse_the_same_shape() {
        let toml_cfg: FeedsConfig = toml::from_str(
            r#"
window_days = 7
rss_urls = ["https://exchange.test/a.xml"]

[external_feeds]
BSE = "https://bse.test/rss"
"#,
        )
        .unwrap();
        let json_cfg: FeedsConfig = serde_json::from_str(
            r#"{"window_days":7,"rss_urls":["https://exchange.test/a.xml"],"external_feeds":{"BSE":"https://bse.test/rss"}}"#,
        )
        .unwrap();
        assert_eq!(toml_cfg.window_days, json_cfg.window_days);
        assert_eq!(toml_cfg.rss_urls, json_cfg.rss_urls);
        assert_eq!(
            toml_cfg.external_feeds.get("BSE"),
            json_cfg.external_feeds.get("BSE")
        );
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_PATH);

        // Nothing on disk → built-in defaults.
        let cfg = load_default().unwrap();
        assert_eq!(cfg.window_days, 10);
        assert!(cfg.rss_urls.is_empty());

        // Env wins over fallbacks.
        let p = tmp.path().join("feeds.toml");
        std::fs::write(&p, "window_days = 3\n").unwrap();
        env::set_var(ENV_PATH, p.display().to_string());
        let cfg2 = load_default().unwrap();
        assert_eq!(cfg2.window_days, 3);
        env::remove_var(ENV_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
