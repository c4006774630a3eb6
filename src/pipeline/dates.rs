// src/pipeline/dates.rs
//! Best-effort date resolution for announcement rows.
//!
//! Resolution chain, first success wins:
//! 1. parse the raw `published` string (RFC 2822, RFC 3339, then the
//!    [`PUBLISHED_FORMATS`] table in order),
//! 2. scan `description` for an embedded date,
//! 3. give up — the caller treats a `None` as "keep the row".
//!
//! All comparisons downstream happen at day granularity, so everything here
//! resolves to a [`NaiveDate`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::model::Item;

/// `strftime` formats tried, in order, after the RFC fast paths. Announcement
/// feeds in the wild are day-first; ISO forms are listed for replayed data.
pub const PUBLISHED_FORMATS: [&str; 6] = [
    "%d-%b-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%b-%Y",
    "%Y-%m-%d",
    "%d/%m/%Y",
];

/// Parse the raw `published` value into a date, if possible.
pub fn parse_published(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in PUBLISHED_FORMATS {
        if fmt.contains("%H") {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        } else if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn re_iso() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b").unwrap())
}

fn re_day_first() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").unwrap())
}

fn re_day_month_name() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{2,4})\b",
        )
        .unwrap()
    })
}

fn re_month_name_day() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{1,2}),?\s+(\d{2,4})\b",
        )
        .unwrap()
    })
}

fn month_number(name: &str) -> Option<u32> {
    let m = match name.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}

fn expand_year(y: i32) -> i32 {
    // Two-digit years are this century.
    if y < 100 {
        2000 + y
    } else {
        y
    }
}

/// Scan free text for an embedded date. The ISO pattern runs before the
/// day-first one so `2026-08-06` is not misread as `26-08-06`.
pub fn extract_from_description(text: &str) -> Option<NaiveDate> {
    if text.trim().is_empty() {
        return None;
    }

    for caps in re_iso().captures_iter(text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }

    for caps in re_day_first().captures_iter(text) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(expand_year(y), m, d) {
            return Some(date);
        }
    }

    for caps in re_day_month_name().captures_iter(text) {
        let d: u32 = caps[1].parse().ok()?;
        let m = month_number(&caps[2])?;
        let y: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(expand_year(y), m, d) {
            return Some(date);
        }
    }

    for caps in re_month_name_day().captures_iter(text) {
        let m = month_number(&caps[1])?;
        let d: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(expand_year(y), m, d) {
            return Some(date);
        }
    }

    None
}

/// Resolve a row's date: `published` first, `description` as fallback.
pub fn resolve_item_date(item: &Item) -> Option<NaiveDate> {
    if let Some(raw) = item.published.as_deref() {
        if let Some(d) = parse_published(raw) {
            return Some(d);
        }
    }
    extract_from_description(&item.description)
}
