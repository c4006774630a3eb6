// src/report.rs
//! Batch search report: the symbol → matches mapping handed to downstream
//! renderers (HTML generation itself lives outside this crate).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Dataset;
use crate::roster::StockRoster;
use crate::search::{self, MatchProfiles, StockMatch};

/// Whether the run may prompt and open a browser. Passed explicitly into
/// report generation instead of being sniffed ambiently by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Interactive,
    NonInteractive,
}

impl ExecutionMode {
    /// Detect from the environment: CI markers or a non-TTY stdin mean
    /// non-interactive. Binaries call this once at the edge and pass the
    /// result down.
    pub fn detect() -> Self {
        use std::io::IsTerminal;
        let ci = std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true")
            || std::env::var("CI").as_deref() == Ok("true");
        if ci || !std::io::stdin().is_terminal() {
            ExecutionMode::NonInteractive
        } else {
            ExecutionMode::Interactive
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub symbol: String,
    /// Roster company name, empty when the roster carries none.
    pub company: String,
    pub matches: Vec<StockMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub mode: ExecutionMode,
    pub total_matches: usize,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// A renderer should only pop a browser for an interactive run that
    /// actually found something.
    pub fn should_open_browser(&self) -> bool {
        self.mode == ExecutionMode::Interactive && self.total_matches > 0
    }
}

/// Evaluate the whole roster against the dataset through the same matching
/// routine the live server uses.
pub fn build_report(
    dataset: &Dataset,
    roster: &StockRoster,
    profiles: &MatchProfiles,
    mode: ExecutionMode,
    now: DateTime<Utc>,
) -> Report {
    let by_symbol = search::search_all(dataset, roster, profiles);
    let mut entries = Vec::with_capacity(by_symbol.len());
    let mut total = 0usize;
    for (symbol, matches) in by_symbol {
        total += matches.len();
        entries.push(ReportEntry {
            company: roster.company_for(&symbol).unwrap_or_default().to_string(),
            symbol,
            matches,
        });
    }
    Report {
        generated_at: now,
        mode,
        total_matches: total,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataset, Item};
    use chrono::TimeZone;

    #[test]
    fn report_totals_and_entries_line_up() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        let ds = Dataset::from_items(vec![Item {
            source: "NSE".into(),
            published: None,
            title: "RELIANCE board meeting".into(),
            link: "https://example.test/r1".into(),
            description: String::new(),
            fetched_at: now,
            extra: Vec::new(),
        }]);
        let roster = StockRoster::from_pairs([("RELIANCE", "Reliance Industries Limited"), ("INFY", "Infosys Limited")]);

        let rep = build_report(&ds, &roster, &MatchProfiles::builtin(), ExecutionMode::NonInteractive, now);
        assert_eq!(rep.total_matches, 1);
        assert_eq!(rep.entries.len(), 2, "every roster symbol gets an entry");
        assert!(!rep.should_open_browser(), "non-interactive never opens a browser");
    }
}
