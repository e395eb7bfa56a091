// 🧩 Row Decoder
// Raw tabular rows → typed entities, through an explicit per-feed schema.
//
// A feed is decoded all-or-nothing: a missing required column rejects the
// whole feed, while an unusable individual cell falls back to its default.

use crate::error::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ============================================================================
// FEED KIND
// ============================================================================

/// FeedKind - which of the three independent feeds a table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    Clients,
    Accounts,
    Agencies,
}

impl FeedKind {
    /// Human-readable name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            FeedKind::Clients => "clients",
            FeedKind::Accounts => "accounts",
            FeedKind::Agencies => "agencies",
        }
    }

    /// Sheet name in the source spreadsheet
    pub fn sheet(&self) -> &'static str {
        match self {
            FeedKind::Clients => "clientes",
            FeedKind::Accounts => "contas",
            FeedKind::Agencies => "agencias",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// RAW TABLE
// ============================================================================

/// RawRow - one data line, column name → cell text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Line in the original feed (1-based, header is line 1)
    pub line_number: u64,
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(line_number: u64) -> Self {
        RawRow {
            line_number,
            fields: HashMap::new(),
        }
    }

    /// Builder pattern: add a cell
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: &str) {
        self.fields.insert(column.to_string(), value.to_string());
    }

    /// Raw cell text, exactly as tokenized
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed cell text; blank cells count as absent
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// RawFeed - header row plus data rows of one feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFeed {
    pub kind: FeedKind,
    /// Column names after de-duplication, in feed order
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawFeed {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Rename repeated column names so no cell is overwritten.
///
/// The first occurrence keeps its name; later ones become `name_1`,
/// `name_2`, … skipping suffixes already taken by another column.
pub fn dedupe_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        let name = header.as_ref();
        if seen.insert(name.to_string()) {
            result.push(name.to_string());
            continue;
        }

        let suffix = next_suffix.entry(name.to_string()).or_insert(1);
        let renamed = loop {
            let candidate = format!("{}_{}", name, suffix);
            *suffix += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(renamed.clone());
        seen.insert(renamed.clone());
        result.push(renamed);
    }

    result
}

// ============================================================================
// SCHEMA
// ============================================================================

/// FeedRecord - an entity that can be decoded from a feed row
///
/// Each entity names its feed, the columns it cannot work without, and
/// how a single row maps onto it. Decoding a row never fails; cells that
/// are absent or unusable take the entity's documented defaults.
pub trait FeedRecord: Sized {
    /// Feed this entity is decoded from
    const KIND: FeedKind;

    /// Required columns. Each inner slice lists alternatives, at least
    /// one of which must be present (e.g. tax id *or* national id).
    fn required_columns() -> &'static [&'static [&'static str]];

    /// Map one row onto the entity
    fn from_row(row: &RawRow) -> Self;
}

/// Check that a header row satisfies an entity's required columns
pub fn check_schema<T: FeedRecord>(headers: &[String]) -> FeedResult<()> {
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(FeedError::MissingHeader { feed: T::KIND });
    }

    for alternatives in T::required_columns() {
        let present = alternatives
            .iter()
            .any(|column| headers.iter().any(|h| h == column));
        if !present {
            return Err(FeedError::MissingColumn {
                feed: T::KIND,
                column: alternatives.join("|"),
            });
        }
    }

    Ok(())
}

/// Decode every row of a feed into `T`, or reject the whole feed
pub fn decode_feed<T: FeedRecord>(feed: &RawFeed) -> FeedResult<Vec<T>> {
    check_schema::<T>(&feed.headers)?;
    Ok(feed.rows.iter().map(T::from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        code: Option<String>,
    }

    impl FeedRecord for Probe {
        const KIND: FeedKind = FeedKind::Agencies;

        fn required_columns() -> &'static [&'static [&'static str]] {
            &[&["id"], &["codigo", "code"]]
        }

        fn from_row(row: &RawRow) -> Self {
            Probe {
                code: row.text("codigo").or_else(|| row.text("code")),
            }
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feed_kind_names() {
        assert_eq!(FeedKind::Clients.to_string(), "clients");
        assert_eq!(FeedKind::Accounts.sheet(), "contas");
        assert_eq!(FeedKind::Agencies.sheet(), "agencias");
    }

    #[test]
    fn test_raw_row_text_treats_blank_as_absent() {
        let row = RawRow::new(2).with("email", "   ").with("nome", " Ana ");
        assert_eq!(row.get("email"), Some("   "));
        assert_eq!(row.text("email"), None);
        assert_eq!(row.text("nome"), Some("Ana".to_string()));
        assert_eq!(row.text("endereco"), None);
    }

    #[test]
    fn test_dedupe_headers_renames_collisions_in_order() {
        let result = dedupe_headers(&["id", "name", "name", "email", "name"]);
        assert_eq!(result, vec!["id", "name", "name_1", "email", "name_2"]);
    }

    #[test]
    fn test_dedupe_headers_skips_taken_suffix() {
        let result = dedupe_headers(&["name", "name_1", "name"]);
        assert_eq!(result, vec!["name", "name_1", "name_2"]);
    }

    #[test]
    fn test_dedupe_headers_without_collisions_is_identity() {
        let result = dedupe_headers(&["id", "codigo", "nome"]);
        assert_eq!(result, vec!["id", "codigo", "nome"]);
    }

    #[test]
    fn test_check_schema_accepts_alternative_column() {
        assert!(check_schema::<Probe>(&headers(&["id", "code"])).is_ok());
        assert!(check_schema::<Probe>(&headers(&["codigo", "id"])).is_ok());
    }

    #[test]
    fn test_check_schema_reports_missing_column() {
        let err = check_schema::<Probe>(&headers(&["id", "nome"])).unwrap_err();
        match err {
            FeedError::MissingColumn { feed, column } => {
                assert_eq!(feed, FeedKind::Agencies);
                assert_eq!(column, "codigo|code");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_schema_blank_header_row() {
        let err = check_schema::<Probe>(&headers(&["", " "])).unwrap_err();
        assert!(matches!(err, FeedError::MissingHeader { .. }));
    }

    #[test]
    fn test_decode_feed_keeps_row_order() {
        let feed = RawFeed {
            kind: FeedKind::Agencies,
            headers: headers(&["id", "codigo"]),
            rows: vec![
                RawRow::new(2).with("id", "a").with("codigo", "10"),
                RawRow::new(3).with("id", "b").with("codigo", ""),
            ],
        };
        let decoded: Vec<Probe> = decode_feed(&feed).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].code.as_deref(), Some("10"));
        assert_eq!(decoded[1].code, None);
    }
}
