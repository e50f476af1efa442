//! Timestamp and number extraction helpers.
//!
//! Every layout in the export leans on the same `DD.MM.YY(YY) HH:MM`
//! convention, so the extraction primitives live here as small pure
//! functions that the section parsers share. A cell that merely looks
//! date-like but fails strict parsing counts as absent.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

/// Loose date-time shape used to classify rows and locate candidates.
pub static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\.\d{2}\.\d{2,4}\s*\d{2}:\d{2}").expect("timestamp pattern")
});

/// Time-range column label: two four-digit-year timestamps joined by a dash.
static TIME_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}\.\d{2}\.\d{4}\s*\d{2}:\d{2})\s*-\s*(\d{2}\.\d{2}\.\d{4}\s*\d{2}:\d{2})")
        .expect("time range pattern")
});

/// Decimal number, comma or point separator.
static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern"));

const TIMESTAMP_FORMATS: [&str; 2] = ["%d.%m.%y %H:%M", "%d.%m.%Y %H:%M"];

/// Strictly parse one timestamp string, two- or four-digit year.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// A row counts as a timestamp row when any cell contains a date-time shape.
pub fn is_timestamp_row(cells: &[&str]) -> bool {
    cells.iter().any(|cell| TIMESTAMP_PATTERN.is_match(cell))
}

/// First strictly parsable timestamp in the row, if any.
pub fn find_timestamp(cells: &[&str]) -> Option<NaiveDateTime> {
    cells
        .iter()
        .filter(|cell| TIMESTAMP_PATTERN.is_match(cell))
        .find_map(|cell| {
            TIMESTAMP_PATTERN
                .find(cell)
                .and_then(|found| parse_timestamp(found.as_str()))
        })
}

/// All strictly parsable timestamps inside one (possibly multi-valued) cell.
pub fn extract_timestamps(cell: &str) -> Vec<NaiveDateTime> {
    TIMESTAMP_PATTERN
        .find_iter(cell)
        .filter_map(|found| parse_timestamp(found.as_str()))
        .collect()
}

/// All numbers inside one cell, comma decimals normalized.
pub fn extract_numbers(cell: &str) -> Vec<f64> {
    NUMBER_PATTERN
        .find_iter(cell)
        .filter_map(|found| found.as_str().replace(',', ".").parse().ok())
        .collect()
}

/// Representative timestamp for a time-range label: the midpoint of the
/// range, one endpoint when only one end parses, or the label itself parsed
/// as a single timestamp.
pub fn range_midpoint(label: &str) -> Option<NaiveDateTime> {
    let cleaned = label.trim().trim_matches('"').replace('\n', " ");
    if let Some(captures) = TIME_RANGE_PATTERN.captures(&cleaned) {
        let start = parse_timestamp(&captures[1]);
        let end = parse_timestamp(&captures[2]);
        return match (start, end) {
            (Some(start), Some(end)) => {
                let half = (end - start) / 2;
                Some(start + half)
            }
            (one, other) => one.or(other),
        };
    }
    parse_timestamp(&cleaned)
}
