// src/roster.rs
//! Stock roster: ticker symbol → company name, loaded once per run and held
//! read-only while searches execute.
//!
//! Four on-disk formats are accepted, picked by extension: TOML and JSON
//! (structured maps), CSV (header-aware, naive comma split), and plain text
//! (one symbol per line, or one comma-separated list). Entries written as
//! `NSE:CRAFTSMAN` / `NYSE:HCC` are stripped to the bare symbol.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockRoster {
    map: BTreeMap<String, String>,
}

impl StockRoster {
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (sym, company) in pairs {
            let sym = parse_symbol(sym.as_ref());
            if !sym.is_empty() {
                map.insert(sym, company.into());
            }
        }
        Self { map }
    }

    /// Company name for a symbol; empty mappings read as `None`.
    pub fn company_for(&self, symbol: &str) -> Option<&str> {
        self.map
            .get(&parse_symbol(symbol))
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.map.contains_key(&parse_symbol(symbol))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Roster symbols closest to `query`, best first. Used for the
    /// "did you mean" hint on unknown query symbols.
    pub fn closest_symbols(&self, query: &str, max: usize) -> Vec<String> {
        let q = parse_symbol(query);
        if q.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(f64, &String)> = self
            .map
            .keys()
            .map(|sym| (strsim::jaro_winkler(&q, sym), sym))
            .filter(|(score, _)| *score >= 0.80)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(max).map(|(_, s)| s.clone()).collect()
    }
}

/// Strip an `EXCHANGE:` prefix and upper-case: `"NSE:CRAFTSMAN"` → `"CRAFTSMAN"`.
pub fn parse_symbol(raw: &str) -> String {
    let s = raw.trim();
    let s = match s.split_once(':') {
        Some((_, sym)) => sym.trim(),
        None => s,
    };
    s.to_ascii_uppercase()
}

/// Load a roster from disk, dispatching on the file extension.
pub fn load(path: &Path) -> Result<StockRoster> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading stock roster from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match ext.as_str() {
        "toml" => parse_toml(&content),
        "json" => parse_json(&content),
        "csv" => Ok(parse_csv(&content)),
        "txt" | "" => Ok(parse_txt(&content)),
        other => Err(anyhow!("unsupported roster format `.{other}` (use .toml/.json/.csv/.txt)")),
    }
}

fn parse_toml(s: &str) -> Result<StockRoster> {
    #[derive(serde::Deserialize)]
    struct TomlRoster {
        stocks: BTreeMap<String, String>,
    }
    let v: TomlRoster = toml::from_str(s).context("parsing TOML roster")?;
    Ok(StockRoster::from_pairs(v.stocks))
}

fn parse_json(s: &str) -> Result<StockRoster> {
    // Either {"SYM": "Company"} or [{"symbol": "...", "company": "..."}].
    #[derive(serde::Deserialize)]
    struct Record {
        symbol: String,
        #[serde(default)]
        company: String,
    }
    if let Ok(map) = serde_json::from_str::<BTreeMap<String, String>>(s) {
        return Ok(StockRoster::from_pairs(map));
    }
    let records: Vec<Record> = serde_json::from_str(s).context("parsing JSON roster")?;
    Ok(StockRoster::from_pairs(
        records.into_iter().map(|r| (r.symbol, r.company)),
    ))
}

/// Naive comma split, first line treated as a header when it names a symbol
/// column. Without a header: column 0 is the symbol and column 3 the company
/// (the layout of exchange "industry/sector" exports), falling back to
/// column 1.
fn parse_csv(content: &str) -> StockRoster {
    let mut lines = content.lines();
    let mut pairs: Vec<(String, String)> = Vec::new();

    let (mut sym_col, mut company_col) = (0usize, None::<usize>);
    let mut first_is_header = false;

    if let Some(first) = lines.clone().next() {
        let headers: Vec<String> = first
            .split(',')
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        for (i, h) in headers.iter().enumerate() {
            match h.as_str() {
                "symbol" | "symbols" | "stock" | "stocks" | "ticker" => {
                    sym_col = i;
                    first_is_header = true;
                }
                "company" | "company name" | "name" => {
                    company_col = Some(i);
                    first_is_header = true;
                }
                _ => {}
            }
        }
    }
    if first_is_header {
        lines.next();
    }

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let symbol = cells.get(sym_col).copied().unwrap_or_default();
        if symbol.is_empty() {
            continue;
        }
        let company = match company_col {
            Some(c) => cells.get(c).copied().unwrap_or_default(),
            None => cells.get(3).or_else(|| cells.get(1)).copied().unwrap_or_default(),
        };
        pairs.push((symbol.to_string(), company.to_string()));
    }

    StockRoster::from_pairs(pairs)
}

/// Symbols only, no company mapping. Accepts one entry per line or a single
/// comma-separated list, with optional `EXCHANGE:` prefixes.
fn parse_txt(content: &str) -> StockRoster {
    let entries: Vec<&str> = if content.contains(',') {
        content.split(',').collect()
    } else {
        content.lines().collect()
    };
    StockRoster::from_pairs(
        entries
            .into_iter()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| (e, String::new())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_prefixes_are_stripped() {
        assert_eq!(parse_symbol("NSE:CRAFTSMAN"), "CRAFTSMAN");
        assert_eq!(parse_symbol("  nyse:hcc "), "HCC");
        assert_eq!(parse_symbol("lt"), "LT");
    }

    #[test]
    fn txt_comma_list_parses() {
        let r = parse_txt("NSE:CRAFTSMAN,NYSE:HCC, NSE:LUMAXIND ");
        let syms: Vec<&str> = r.symbols().collect();
        assert_eq!(syms, ["CRAFTSMAN", "HCC", "LUMAXIND"]);
        assert_eq!(r.company_for("CRAFTSMAN"), None);
    }

    #[test]
    fn csv_with_header_uses_named_columns() {
        let r = parse_csv("Symbol,Company\nRELIANCE,Reliance Industries Limited\nLT,Larsen & Toubro Ltd\n");
        assert_eq!(r.company_for("RELIANCE"), Some("Reliance Industries Limited"));
        assert_eq!(r.company_for("LT"), Some("Larsen & Toubro Ltd"));
    }

    #[test]
    fn headerless_csv_takes_fourth_column() {
        let r = parse_csv("RELIANCE,EQ,INE002A01018,Reliance Industries Limited\n");
        assert_eq!(r.company_for("RELIANCE"), Some("Reliance Industries Limited"));
    }

    #[test]
    fn suggestions_rank_near_misses_first() {
        let r = StockRoster::from_pairs([
            ("RELIANCE", "Reliance Industries Limited"),
            ("RELAXO", "Relaxo Footwears Limited"),
            ("INFY", "Infosys Limited"),
        ]);
        let got = r.closest_symbols("RELIANC", 2);
        assert_eq!(got.first().map(String::as_str), Some("RELIANCE"));
    }
}
