// src/model.rs
//! Row model shared by every feed provider and everything downstream.
//!
//! An [`Item`] is one announcement/news record. A [`Dataset`] is an ordered
//! collection of items plus its column ordering: the canonical columns always
//! come first, extra per-source columns follow in first-seen order.

use chrono::{DateTime, Utc};

/// Fixed column prefix. Always present, always in this order, no matter
/// which source contributed the rows.
pub const CANONICAL_COLUMNS: [&str; 6] = [
    "source",
    "published",
    "title",
    "link",
    "description",
    "fetched_at",
];

/// One announcement record with a uniform core shape and an open-ended tail
/// of per-source fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    /// Identifier of the originating feed (unique per logical source).
    pub source: String,
    /// Raw date string exactly as the source supplied it; `None` when the
    /// source provides no structured date. Parsing is the recency filter's
    /// job, not the provider's.
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Dedup key. Empty when the source omitted it; empty links never count
    /// as duplicates of each other.
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    /// Retrieval timestamp, always present.
    pub fetched_at: DateTime<Utc>,
    /// Extra named fields present only for some sources (`symbol`, `isin`,
    /// `attachment`, `xbrl_link`, ...). Insertion order is preserved so the
    /// dataset's column order stays first-seen.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<(String, String)>,
}

impl Item {
    /// Look up an extra field by name. Absent fields read as `None`, which
    /// callers must treat as "empty", never as an error.
    pub fn extra_field(&self, name: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// String representations of every field, canonical first, extras after.
    /// This is the search surface a blob is built from.
    pub fn field_strings(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(6 + self.extra.len());
        out.push(self.source.clone());
        out.push(self.published.clone().unwrap_or_default());
        out.push(self.title.clone());
        out.push(self.link.clone());
        out.push(self.description.clone());
        out.push(self.fetched_at.to_rfc3339());
        for (_, v) in &self.extra {
            out.push(v.clone());
        }
        out
    }
}

/// An ordered collection of items plus the canonical column ordering.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    pub items: Vec<Item>,
    pub columns: Vec<String>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from rows, deriving the column order: canonical
    /// prefix, then extra column names in first-seen order.
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut ds = Self {
            items,
            columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        };
        ds.recompute_columns();
        ds
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Re-derive `columns` from the rows currently held. Canonical names are
    /// pinned to the front even if no row carries them.
    pub fn recompute_columns(&mut self) {
        let mut columns: Vec<String> =
            CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        for item in &self.items {
            for (name, _) in &item.extra {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
        }
        self.columns = columns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item_with_extra(source: &str, extra: &[(&str, &str)]) -> Item {
        Item {
            source: source.to_string(),
            published: None,
            title: "t".into(),
            link: "l".into(),
            description: "d".into(),
            fetched_at: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            extra: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn canonical_prefix_is_stable() {
        let ds = Dataset::from_items(vec![item_with_extra("A", &[("isin", "X")])]);
        assert_eq!(&ds.columns[..6], &CANONICAL_COLUMNS.map(String::from));
        assert_eq!(ds.columns[6], "isin");
    }

    #[test]
    fn extra_columns_keep_first_seen_order() {
        let ds = Dataset::from_items(vec![
            item_with_extra("A", &[("symbol", "X"), ("isin", "Y")]),
            item_with_extra("B", &[("isin", "Z"), ("industry", "W")]),
        ]);
        assert_eq!(ds.columns[6..], ["symbol", "isin", "industry"].map(String::from));
    }

    #[test]
    fn absent_extra_reads_as_none() {
        let it = item_with_extra("A", &[]);
        assert_eq!(it.extra_field("attachment"), None);
    }
}
