// src/search.rs
//! Fuzzy stock-matching engine over the aggregated table.
//!
//! Every row is flattened into a search blob (all field values, upper-cased)
//! and candidate terms are matched against it: long terms by substring,
//! short ones (≤ 3 chars) as whole tokens at word boundaries, because 1–3
//! letter tickers are routinely substrings of unrelated words. Per-source
//! rule variants live in a lookup table, not in the algorithm.
//!
//! The batch path (`search_all`) and the single-symbol path (`search`) share
//! one per-row routine; drift between the report and the live server is the
//! main correctness risk, so there is deliberately no fork to maintain.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::QueryError;
use crate::model::{Dataset, Item};
use crate::roster::{self, StockRoster};

/// Substring matching is allowed only above this term length.
const SUBSTRING_MIN_LEN: usize = 4;

/// Word-boundary class used when matching short terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryClass {
    /// Tokens are maximal alphanumeric runs; any other character or a string
    /// edge delimits.
    Standard,
    /// Digits delimit as well. For feeds that glue numeric scrip codes
    /// directly onto symbols (`"500325RELIANCE"`).
    DigitsDelimit,
}

/// Per-source matching-rule table. New source exceptions are new entries
/// here; the matching routine itself stays uniform.
#[derive(Debug, Clone, Default)]
pub struct MatchProfiles {
    rules: BTreeMap<String, BoundaryClass>,
}

impl MatchProfiles {
    /// Built-in table: BSE feed text packs numeric scrip codes against
    /// symbols, so it gets the relaxed boundary class.
    pub fn builtin() -> Self {
        Self::default().with_rule("BSE", BoundaryClass::DigitsDelimit)
    }

    pub fn with_rule(mut self, source: &str, class: BoundaryClass) -> Self {
        self.rules.insert(source.to_ascii_uppercase(), class);
        self
    }

    pub fn rule_for(&self, source: &str) -> BoundaryClass {
        self.rules
            .get(&source.to_ascii_uppercase())
            .copied()
            .unwrap_or(BoundaryClass::Standard)
    }
}

/// One matched row plus the keyword that produced the hit, for downstream
/// highlighting.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StockMatch {
    pub item: Item,
    pub matched_keyword: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchResult {
    pub symbol: String,
    pub matches: Vec<StockMatch>,
}

/// Flatten a row into its search surface: every field's string value,
/// canonical and extra alike, space-joined and upper-cased. Rebuilt per
/// query — the table is bounded by the recency window, an index would not
/// pay for itself.
pub fn blob_for(item: &Item) -> String {
    item.field_strings().join(" ").to_uppercase()
}

fn is_word_char(c: char, class: BoundaryClass) -> bool {
    match class {
        BoundaryClass::Standard => c.is_alphanumeric(),
        BoundaryClass::DigitsDelimit => c.is_alphabetic(),
    }
}

/// Whole-token match: `term` must occur delimited by non-word characters or
/// string edges under the given boundary class.
fn token_match(blob: &str, term: &str, class: BoundaryClass) -> bool {
    let mut start = 0;
    while let Some(pos) = blob[start..].find(term) {
        let at = start + pos;
        let end = at + term.len();
        let before_ok = blob[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c, class));
        let after_ok = blob[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c, class));
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

/// Matching rule for one candidate term. Long terms accept substring hits
/// (recall over precision for distinctive names); short ones must match as
/// whole tokens.
fn term_matches(blob: &str, term: &str, class: BoundaryClass) -> bool {
    if term.chars().count() >= SUBSTRING_MIN_LEN {
        blob.contains(term)
    } else {
        token_match(blob, term, class)
    }
}

/// Upper-case and fold common legal-form variations so company names from
/// the roster line up with the way feeds print them.
pub fn normalize_company_name(name: &str) -> String {
    let mut n = name.trim().to_uppercase();
    for (old, new) in [
        ("PRIVATE LIMITED", "PVT LTD"),
        ("PVT. LTD.", "PVT LTD"),
        ("PRIVATE LTD.", "PVT LTD"),
        ("PRIVATE LTD", "PVT LTD"),
        ("LIMITED", "LTD"),
        ("INCORPORATED", "INC"),
        ("CORPORATION", "CORP"),
        ("LTD.", "LTD"),
        ("INC.", "INC"),
        ("CORP.", "CORP"),
        ("&", "AND"),
    ] {
        n = n.replace(old, new);
    }
    n = n.replace(
        ['.', ',', ';', ':', '(', ')', '[', ']', '{', '}'],
        "",
    );
    n.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop trailing legal-form tokens to widen recall on the company name.
fn strip_legal_suffixes(normalized: &str) -> String {
    const SUFFIXES: [&str; 5] = ["LTD", "PVT", "INC", "CORP", "CO"];
    let mut words: Vec<&str> = normalized.split_whitespace().collect();
    while let Some(last) = words.last() {
        if SUFFIXES.contains(last) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

/// One candidate term. Normalized terms are matched against a normalized
/// copy of the blob so `&`/`AND` and legal-form spellings line up on both
/// sides.
#[derive(Debug, Clone, PartialEq)]
struct Term {
    text: String,
    normalized: bool,
}

/// Candidate match terms in priority order: the symbol itself, the mapped
/// company name, then its normalization and the suffix-stripped variant.
/// Duplicates and empties drop out, order survives.
fn candidate_terms(symbol: &str, company: Option<&str>) -> Vec<Term> {
    let mut terms: Vec<Term> = Vec::with_capacity(4);
    let mut push = |text: String, normalized: bool, terms: &mut Vec<Term>| {
        if !text.is_empty() && !terms.iter().any(|t| t.text == text) {
            terms.push(Term { text, normalized });
        }
    };

    push(symbol.trim().to_uppercase(), false, &mut terms);
    if let Some(company) = company {
        let normalized = normalize_company_name(company);
        push(company.trim().to_uppercase(), false, &mut terms);
        push(normalized.clone(), true, &mut terms);
        push(strip_legal_suffixes(&normalized), true, &mut terms);
    }
    terms
}

fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// The one per-row matching routine. Both the single-symbol path and the
/// batch path go through here.
fn collect_matches(
    dataset: &Dataset,
    symbol: &str,
    company: Option<&str>,
    profiles: &MatchProfiles,
) -> Vec<StockMatch> {
    let terms = candidate_terms(symbol, company);
    if terms.is_empty() {
        return Vec::new();
    }
    let need_normalized = terms.iter().any(|t| t.normalized);

    dataset
        .items
        .iter()
        .filter_map(|item| {
            let blob = blob_for(item);
            let blob_normalized = need_normalized.then(|| normalize_company_name(&blob));
            let class = profiles.rule_for(&item.source);
            terms
                .iter()
                .find(|t| {
                    let surface = if t.normalized {
                        blob_normalized.as_deref().unwrap_or(&blob)
                    } else {
                        &blob
                    };
                    term_matches(surface, &t.text, class)
                })
                .map(|t| StockMatch {
                    item: item.clone(),
                    matched_keyword: t.text.clone(),
                })
        })
        .collect()
}

/// Single-symbol search. A symbol unknown to the roster is still searched
/// on its own; an empty result is a result, not an error.
pub fn search(
    dataset: &Dataset,
    roster_map: &StockRoster,
    profiles: &MatchProfiles,
    raw_symbol: &str,
) -> Result<SearchResult, QueryError> {
    if raw_symbol.trim().is_empty() {
        return Err(QueryError::InvalidQuery("empty symbol".into()));
    }
    let symbol = roster::parse_symbol(raw_symbol);
    let company = roster_map.company_for(&symbol);
    let matches = collect_matches(dataset, &symbol, company, profiles);

    debug!(
        target: "search",
        id = %anon_hash(&symbol),
        known = roster_map.contains(&symbol),
        hits = matches.len(),
        "single-symbol search"
    );

    Ok(SearchResult { symbol, matches })
}

/// Batch search: evaluate every roster symbol against the dataset. Reuses
/// the identical per-row routine as [`search`], so for any symbol `S` the
/// entry here equals the single-symbol result for `S`.
pub fn search_all(
    dataset: &Dataset,
    roster_map: &StockRoster,
    profiles: &MatchProfiles,
) -> BTreeMap<String, Vec<StockMatch>> {
    let mut out = BTreeMap::new();
    for (symbol, company) in roster_map.iter() {
        let company = if company.is_empty() { None } else { Some(company) };
        out.insert(
            symbol.to_string(),
            collect_matches(dataset, symbol, company, profiles),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(source: &str, title: &str) -> Item {
        Item {
            source: source.to_string(),
            published: None,
            title: title.to_string(),
            link: format!("https://example.test/{}", title.len()),
            description: String::new(),
            fetched_at: Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap(),
            extra: Vec::new(),
        }
    }

    fn dataset(rows: Vec<Item>) -> Dataset {
        Dataset::from_items(rows)
    }

    #[test]
    fn short_symbol_needs_word_boundary() {
        let ds = dataset(vec![row("NSE", "Mumbai office expansion announced")]);
        let roster = StockRoster::from_pairs([("M", "")]);
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "M").unwrap();
        assert!(r.matches.is_empty(), "M must not match inside Mumbai");

        let ds = dataset(vec![row("NSE", "Allotment to M and others")]);
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "M").unwrap();
        assert_eq!(r.matches.len(), 1);
    }

    #[test]
    fn long_symbol_substring_is_accepted() {
        // Accepted false-positive trade: distinctive long names match anywhere.
        let ds = dataset(vec![row("NSE", "Update from RELIANCEIND desk")]);
        let roster = StockRoster::default();
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "RELIANCE").unwrap();
        assert_eq!(r.matches.len(), 1);
        assert_eq!(r.matches[0].matched_keyword, "RELIANCE");
    }

    #[test]
    fn company_name_matches_when_symbol_does_not() {
        let ds = dataset(vec![row("NSE", "Larsen & Toubro wins infra order")]);
        let roster = StockRoster::from_pairs([("LT", "Larsen & Toubro Limited")]);
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "LT").unwrap();
        assert_eq!(r.matches.len(), 1);
        // Symbol has priority but "LT" fails the boundary rule here, the
        // normalized company name lands the hit.
        assert!(r.matches[0].matched_keyword.starts_with("LARSEN"));
    }

    #[test]
    fn loose_source_lets_digits_delimit() {
        let ds = dataset(vec![
            row("BSE", "532500M allotment notice"),
            row("NSE", "532500M allotment notice"),
        ]);
        let roster = StockRoster::from_pairs([("M", "")]);
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "M").unwrap();
        assert_eq!(r.matches.len(), 1);
        assert_eq!(r.matches[0].item.source, "BSE");
    }

    #[test]
    fn symbol_outranks_company_in_matched_keyword() {
        let ds = dataset(vec![row("NSE", "INFY and Infosys Limited both named")]);
        let roster = StockRoster::from_pairs([("INFY", "Infosys Limited")]);
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "INFY").unwrap();
        assert_eq!(r.matches[0].matched_keyword, "INFY");
    }

    #[test]
    fn empty_symbol_is_invalid_query() {
        let ds = dataset(vec![]);
        let roster = StockRoster::default();
        let err = search(&ds, &roster, &MatchProfiles::builtin(), "   ").unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery(_)));
    }

    #[test]
    fn normalize_folds_legal_forms() {
        assert_eq!(
            normalize_company_name("Reliance Industries Limited"),
            "RELIANCE INDUSTRIES LTD"
        );
        assert_eq!(
            normalize_company_name("Larsen & Toubro, Ltd."),
            "LARSEN AND TOUBRO LTD"
        );
    }

    #[test]
    fn extras_are_part_of_the_blob() {
        let mut it = row("NSE", "Corporate action");
        it.extra.push(("symbol".into(), "CRAFTSMAN".into()));
        let ds = dataset(vec![it]);
        let roster = StockRoster::default();
        let r = search(&ds, &roster, &MatchProfiles::builtin(), "CRAFTSMAN").unwrap();
        assert_eq!(r.matches.len(), 1);
    }
}
