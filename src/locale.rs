// 🇧🇷 Locale Value Parser
// Turns the loosely formatted text cells of the spreadsheet feeds into
// typed values. Currency cells come in Brazilian notation ("R$ 1.234,56")
// and dates as ISO strings, sometimes as "dd/mm/yyyy".
//
// The list view, the detail view and the decoder all go through these
// functions, so a value never formats one way on one screen and another
// way on the next.

use chrono::NaiveDate;

/// Literal currency symbol stripped before parsing
pub const CURRENCY_SYMBOL: &str = "R$";

/// Sentinel shown for absent or unusable display values
pub const UNAVAILABLE: &str = "informação indisponível";

// ============================================================================
// RAW INPUT
// ============================================================================

/// A cell value as it reaches the parser.
///
/// Spreadsheet exports are text, but already-typed values (e.g. an amount
/// coming back from an entity) go through the same entry points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawAmount<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl<'a> From<&'a str> for RawAmount<'a> {
    fn from(text: &'a str) -> Self {
        RawAmount::Text(text)
    }
}

impl<'a> From<&'a String> for RawAmount<'a> {
    fn from(text: &'a String) -> Self {
        RawAmount::Text(text.as_str())
    }
}

impl From<f64> for RawAmount<'_> {
    fn from(number: f64) -> Self {
        RawAmount::Number(number)
    }
}

impl<'a> From<Option<&'a str>> for RawAmount<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(RawAmount::Missing, RawAmount::Text)
    }
}

impl From<Option<f64>> for RawAmount<'_> {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RawAmount::Missing, RawAmount::Number)
    }
}

// ============================================================================
// CURRENCY
// ============================================================================

/// Parse a currency cell.
///
/// Text is cleaned in a fixed order: drop the "R$" symbol, drop the
/// thousands-separator periods, turn the decimal comma into a period,
/// drop whitespace, then parse. Numbers pass through unchanged. Anything
/// that does not parse is `None`; the caller picks the default.
///
/// ```
/// use client_roster::locale::parse_currency;
/// assert_eq!(parse_currency("R$ 1.234,56"), Some(1234.56));
/// assert_eq!(parse_currency(1234.56), Some(1234.56));
/// assert_eq!(parse_currency(""), None);
/// ```
pub fn parse_currency<'a>(raw: impl Into<RawAmount<'a>>) -> Option<f64> {
    match raw.into() {
        RawAmount::Number(number) => Some(number),
        RawAmount::Text(text) => parse_currency_text(text),
        RawAmount::Missing => None,
    }
}

fn parse_currency_text(text: &str) -> Option<f64> {
    let cleaned = text
        .replacen(CURRENCY_SYMBOL, "", 1)
        .replace('.', "")
        .replacen(',', ".", 1);

    // "R$ 10,00", "-R$ 10,00" and NBSP-separated exports all collapse here
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an integer cell (agency codes) with the same cleaning rule as
/// currency. Fractional values are rejected.
pub fn parse_integer<'a>(raw: impl Into<RawAmount<'a>>) -> Option<i64> {
    parse_currency(raw)
        .filter(|n| n.is_finite() && n.fract() == 0.0)
        .filter(|n| *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
        .map(|n| n as i64)
}

/// Format a value for display in pt-BR currency notation.
///
/// Returns [`UNAVAILABLE`] when the value is missing or does not survive
/// [`parse_currency`].
pub fn format_money<'a>(raw: impl Into<RawAmount<'a>>) -> String {
    match parse_currency(raw) {
        Some(value) if value.is_finite() && value.abs() <= MAX_DISPLAY_AMOUNT => {
            format_brl(value)
        }
        _ => UNAVAILABLE.to_string(),
    }
}

/// Largest magnitude `format_brl` renders exactly; whole cents must fit in a u64
pub const MAX_DISPLAY_AMOUNT: f64 = 1e17;

/// Format a finite amount as "R$ 1.234,56" (negative: "-R$ 1.234,56").
/// Amounts beyond `MAX_DISPLAY_AMOUNT` saturate; `format_money` reports
/// them as unavailable instead.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let fraction = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{} {},{:02}", sign, CURRENCY_SYMBOL, grouped, fraction)
}

// ============================================================================
// DATES
// ============================================================================

/// Birth date used when the feed has none. Sorts before every real date.
pub fn unknown_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parse a date cell, falling back to [`unknown_date`] when the cell is
/// absent or unreadable.
pub fn parse_date(raw: Option<&str>) -> NaiveDate {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_date_text)
        .unwrap_or_else(unknown_date)
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    // "2024-03-20" and "2024-03-20T00:00:00.000Z" share the first 10 chars
    if let Some(date) = text
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(date);
    }

    NaiveDate::parse_from_str(text, "%d/%m/%Y").ok()
}

/// Format a date as "dd/mm/yyyy"; the unknown-date sentinel yields `None`
pub fn format_date(date: NaiveDate) -> Option<String> {
    if date == unknown_date() {
        None
    } else {
        Some(date.format("%d/%m/%Y").to_string())
    }
}

/// Optional display text, or the [`UNAVAILABLE`] sentinel
pub fn or_unavailable(value: Option<&str>) -> &str {
    value.filter(|s| !s.trim().is_empty()).unwrap_or(UNAVAILABLE)
}
