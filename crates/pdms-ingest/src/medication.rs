//! Medication interval parser.
//!
//! A medication block alternates header rows (column titles per drug class)
//! with value rows. One value row describes all administrations of one drug
//! preparation: the start, stop and rate cells can hold several stacked
//! values when the infusion was re-titrated. Each extracted start opens one
//! event; stops and rates pair positionally with the starts.

use pdms_model::{Event, Value};
use regex::Regex;
use std::sync::LazyLock;

use crate::delimiter::Delimiter;
use crate::timestamp::{extract_numbers, extract_timestamps, is_timestamp_row};

const COLUMN_CONCENTRATION: &str = "Konzentration";
const COLUMN_APPLICATION: &str = "App.- form";
const COLUMN_START: &str = "Start/Änderung";
const COLUMN_STOP: &str = "Stopp";
const COLUMN_RATE: &str = "Rate(mL/h)";

/// Quoted cells may contain embedded newlines; flatten them before the
/// line-oriented walk.
static QUOTED_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"(.*?)""#).expect("quoted cell pattern"));

/// Resolved column indices of one header row.
#[derive(Debug, Clone, Copy)]
struct MedicationColumns {
    medication: usize,
    concentration: usize,
    start: usize,
    stop: usize,
    rate: usize,
}

/// Parse the medication block into one event per administration interval.
///
/// The i-th start pairs with the i-th rate; missing rates fall back to the
/// raw concentration cell as the event value. The stop column participates
/// in header resolution (rows narrower than the resolved layout are
/// malformed and skipped) but stop times are not carried on the event —
/// nothing downstream consumes them.
pub fn parse_medication(text: &str, delimiter: Delimiter) -> Vec<Event> {
    let flattened = flatten_quoted_cells(text);
    let mut events = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut buffer: Vec<Vec<String>> = Vec::new();

    for line in flattened.lines() {
        let cells: Vec<String> = line
            .split(delimiter.as_char())
            .map(|cell| cell.to_string())
            .collect();
        let refs: Vec<&str> = cells.iter().map(String::as_str).collect();
        if !is_timestamp_row(&refs) {
            process_block(header.as_deref(), &buffer, &mut events);
            header = Some(cells);
            buffer.clear();
        } else if header.is_some() {
            buffer.push(cells);
        }
    }
    process_block(header.as_deref(), &buffer, &mut events);
    events
}

fn flatten_quoted_cells(text: &str) -> String {
    QUOTED_CELL
        .replace_all(text, |captures: &regex::Captures<'_>| {
            captures[0].replace('\n', " ").replace(['\r', '"'], "")
        })
        .into_owned()
}

/// Resolve the drug-class label and column indices from a header row.
/// The drug column is wherever the label sits; the remaining columns are
/// found by exact title lookup. A header missing any title is skipped.
fn resolve_columns(header: &[String]) -> Option<(String, MedicationColumns)> {
    let (medication, label) = header
        .iter()
        .enumerate()
        .find(|(_, cell)| !cell.trim().is_empty())
        .map(|(index, cell)| (index, cell.trim().to_string()))?;
    let position = |title: &str| header.iter().position(|cell| cell.trim() == title);
    Some((
        label,
        MedicationColumns {
            medication,
            concentration: position(COLUMN_CONCENTRATION)?,
            start: position(COLUMN_START)?,
            stop: position(COLUMN_STOP)?,
            rate: position(COLUMN_RATE)?,
        },
    ))
}

fn process_block(header: Option<&[String]>, rows: &[Vec<String>], events: &mut Vec<Event>) {
    let Some(header) = header else {
        return;
    };
    if rows.is_empty() {
        return;
    }
    let Some((category, columns)) = resolve_columns(header) else {
        return;
    };
    let widest = columns
        .medication
        .max(columns.concentration)
        .max(columns.start)
        .max(columns.stop)
        .max(columns.rate);

    for row in rows {
        if row.len() <= widest {
            continue;
        }
        let starts = extract_timestamps(&row[columns.start]);
        let rates = extract_numbers(&row[columns.rate]);

        for (index, start) in starts.iter().enumerate() {
            let rate = rates.get(index).copied();
            let value = match rate {
                Some(rate) => Value::Number(rate),
                None => Value::Text(row[columns.concentration].trim().to_string()),
            };
            events.push(Event {
                timestamp: *start,
                category: category.clone(),
                parameter: row[columns.medication].trim().to_string(),
                value,
                source_type: "Medication".to_string(),
                source_header: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, mi: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    const HEADER: &str =
        "Perfusoren;Konzentration;App.- form;Start/Änderung;Stopp;Rate(mL/h)";

    #[test]
    fn stacked_starts_zip_with_stacked_rates() {
        let text = format!(
            "{HEADER}\nNorepinephrin Perfusor 5 mg / 50 ml;5 mg / 50 ml;i.v.;01.09.25 10:00 01.09.25 14:00;01.09.25 12:00 01.09.25 18:00;4,5 6"
        );
        let events = parse_medication(&text, Delimiter::Semicolon);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, at(1, 10, 0));
        assert_eq!(events[0].value, Value::Number(4.5));
        assert_eq!(events[1].timestamp, at(1, 14, 0));
        assert_eq!(events[1].value, Value::Number(6.0));
        assert_eq!(events[0].category, "Perfusoren");
        assert_eq!(events[0].parameter, "Norepinephrin Perfusor 5 mg / 50 ml");
    }

    #[test]
    fn missing_rate_falls_back_to_the_concentration_cell() {
        let text = format!("{HEADER}\nHeparin;25000 IE / 50 ml;i.v.;02.09.25 08:00;;");
        let events = parse_medication(&text, Delimiter::Semicolon);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, Value::Text("25000 IE / 50 ml".to_string()));
    }

    #[test]
    fn a_second_header_row_rebinds_the_columns() {
        let text = format!(
            "{HEADER}\nDobutamin;250 mg / 50 ml;i.v.;03.09.25 09:00;;2\nSonden;Konzentration;App.- form;Start/Änderung;Stopp;Rate(mL/h)\nSondenkost;;enteral;03.09.25 12:00;;30"
        );
        let events = parse_medication(&text, Delimiter::Semicolon);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category, "Perfusoren");
        assert_eq!(events[1].category, "Sonden");
        assert_eq!(events[1].parameter, "Sondenkost");
    }

    #[test]
    fn embedded_newlines_in_quoted_cells_are_flattened() {
        let text = format!(
            "{HEADER}\n\"Milrinon\nPerfusor\";10 mg / 50 ml;i.v.;04.09.25 07:00;;1,5"
        );
        let events = parse_medication(&text, Delimiter::Semicolon);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].parameter, "Milrinon Perfusor");
    }

    #[test]
    fn header_without_column_titles_is_skipped() {
        let text = "stray prose without titles\nsomething;else;03.09.25 10:00";
        let events = parse_medication(text, Delimiter::Semicolon);
        assert!(events.is_empty());
    }
}
