//! Fluid-balance matrix parser.
//!
//! Columns are labeled with time ranges (`DD.MM.YYYY HH:MM - DD.MM.YYYY
//! HH:MM`) instead of single timestamps, and the label column alternates
//! between category headers and parenthesized parameter rows. Cells are
//! quoted and may contain embedded newlines, so this block goes through a
//! real CSV reader instead of the line-oriented split.

use std::collections::BTreeMap;

use csv::ReaderBuilder;
use pdms_model::{Event, Value};

use crate::delimiter::Delimiter;
use crate::timestamp::range_midpoint;

/// Column carrying the category / parameter label.
const LABEL_COLUMN: usize = 3;

/// Matrix title cell excluded from the time-column map.
const MATRIX_TITLE: &str = "flüssigkeitsbilanz";

/// Parse the fluid-balance block. Every populated time-range cell of a
/// parameter row becomes one event timestamped at the midpoint of its
/// column's range; the raw range label is preserved in `source_header`.
pub fn parse_fluid_balance(text: &str, delimiter: Delimiter) -> Vec<Event> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    let Some(header_row) = rows.first() else {
        return Vec::new();
    };

    let time_columns = time_columns(header_row);
    let mut events = Vec::new();
    let mut current_category: Option<String> = None;

    for row in rows.iter().skip(1) {
        let label = row
            .get(LABEL_COLUMN)
            .map(|cell| cell.trim())
            .unwrap_or_default();
        if label.is_empty() {
            continue;
        }

        if !has_numeric_content(row, &time_columns) {
            current_category = Some(label.to_string());
            continue;
        }

        let parameter = label.trim_matches(['(', ')', ' ']).to_string();
        for (&column, range_label) in &time_columns {
            let Some(cell) = row.get(column) else {
                continue;
            };
            let compact = cell.trim().replace(' ', "").replace(',', ".");
            if compact.is_empty() {
                continue;
            }
            let Ok(value) = compact.parse::<f64>() else {
                continue;
            };
            let Some(timestamp) = range_midpoint(range_label) else {
                continue;
            };
            events.push(Event {
                timestamp,
                category: current_category.clone().unwrap_or_else(|| "unknown".to_string()),
                parameter: parameter.clone(),
                value: Value::Number(value),
                source_type: "FluidBalance".to_string(),
                source_header: Some(range_label.clone()),
            });
        }
    }
    events
}

/// Column index → time-range label, from the header row.
fn time_columns(header_row: &[String]) -> BTreeMap<usize, String> {
    let mut columns = BTreeMap::new();
    for (index, cell) in header_row.iter().enumerate() {
        let cleaned = cell.trim().trim_matches('"');
        if !cleaned.is_empty() && cleaned.to_lowercase() != MATRIX_TITLE {
            columns.insert(index, cleaned.replace('\n', " "));
        }
    }
    columns
}

/// A row without a digit in any time-range column is a category header.
fn has_numeric_content(row: &[String], time_columns: &BTreeMap<usize, String>) -> bool {
    time_columns.keys().any(|&column| {
        row.get(column)
            .is_some_and(|cell| cell.chars().any(|ch| ch.is_ascii_digit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str =
        "Flüssigkeitsbilanz;;;;10.09.2025 06:00 - 10.09.2025 14:00;10.09.2025 14:00 - 10.09.2025 22:00";

    #[test]
    fn category_rows_scope_the_following_parameters() {
        let text = format!(
            "{HEADER}\n;;;Einfuhr;;\n;;;(Kristalloide);1 200;850\n;;;Ausfuhr;;\n;;;(Urin);950;"
        );
        let events = parse_fluid_balance(&text, Delimiter::Semicolon);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].category, "Einfuhr");
        assert_eq!(events[0].parameter, "Kristalloide");
        assert_eq!(events[0].value, Value::Number(1200.0));
        assert_eq!(events[2].category, "Ausfuhr");
        assert_eq!(events[2].parameter, "Urin");
    }

    #[test]
    fn timestamps_are_range_midpoints() {
        let text = format!("{HEADER}\n;;;Einfuhr;;\n;;;(Kristalloide);500;");
        let events = parse_fluid_balance(&text, Delimiter::Semicolon);
        assert_eq!(
            events[0].timestamp,
            NaiveDate::from_ymd_opt(2025, 9, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(
            events[0].source_header.as_deref(),
            Some("10.09.2025 06:00 - 10.09.2025 14:00")
        );
    }

    #[test]
    fn non_numeric_cells_are_skipped() {
        let text = format!("{HEADER}\n;;;Einfuhr;;\n;;;(Kommentar);n/a 1;");
        let events = parse_fluid_balance(&text, Delimiter::Semicolon);
        // "n/a 1" contains a digit, so the row counts as a parameter row,
        // but the cell itself fails numeric conversion and emits nothing.
        assert!(events.is_empty());
    }
}
