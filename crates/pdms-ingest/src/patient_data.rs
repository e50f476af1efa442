//! Nested device block parser for the `ALLE Patientendaten` section.
//!
//! This catch-all section has no fixed block titles. Rows are tagged by a
//! free-floating sub-header in a dedicated column (device or score name,
//! e.g. `ECMO`, `Impella CP`, `GCS (Jugendliche und Erwachsene)`). The same
//! device can be deployed several times in one stay, so every new
//! occurrence of a sub-header opens a numbered instance (`ECMO 1`,
//! `ECMO 2`) instead of merging into the first.
//!
//! Inside an instance three row shapes occur: timestamp rows, two-column
//! key/value rows, and narrative free text. Free-text rows belonging to the
//! same timestamp are joined with newlines into one value so notes survive
//! as a single event.

use std::collections::{BTreeMap, BTreeSet};

use pdms_model::{Event, Value};
use regex::Regex;
use std::sync::LazyLock;

use crate::delimiter::Delimiter;
use crate::timestamp::{TIMESTAMP_PATTERN, find_timestamp};

/// Column carrying the sub-header (0-based, after delimiter split).
const SUB_HEADER_COLUMN: usize = 2;
/// Key/value rows: parameter column.
const KV_PARAMETER_COLUMN: usize = 4;
/// Key/value rows: value column.
const KV_VALUE_COLUMN: usize = 9;
/// Free-text fragments shorter than this that mention the notes caption are
/// layout artifacts, not content.
const BOILERPLATE_MAX_LEN: usize = 20;
const NOTES_CAPTION: &str = "Arztnotizen";

/// Author initials such as `F. K.` are filtered from free text.
static AUTHOR_INITIALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\.\s*[A-Z]\.$").expect("author initials pattern"));

/// Parse the whole section into events. Each event's `source_header`
/// carries the sub-header; the category is the numbered instance label.
pub fn parse_patient_data(text: &str, delimiter: Delimiter) -> Vec<Event> {
    let lines: Vec<&str> = text.lines().collect();
    let headers = collect_sub_headers(&lines, delimiter);
    let mut events = Vec::new();
    for (header, instances) in group_instances(&lines, delimiter, &headers) {
        for (label, instance_lines) in instances {
            parse_instance(&instance_lines, delimiter, &header, &label, &mut events);
        }
    }
    events
}

/// Distinct sub-header strings of the section: column 2 populated while
/// columns 0 and 1 are empty, excluding the `Datum` column caption.
fn collect_sub_headers(lines: &[&str], delimiter: Delimiter) -> BTreeSet<String> {
    let mut headers = BTreeSet::new();
    for line in lines {
        let cells: Vec<&str> = line.split(delimiter.as_char()).collect();
        if cells.len() > SUB_HEADER_COLUMN
            && cells[0].is_empty()
            && cells[1].is_empty()
            && !cells[SUB_HEADER_COLUMN].is_empty()
            && cells[SUB_HEADER_COLUMN] != "Datum"
        {
            headers.insert(cells[SUB_HEADER_COLUMN].to_string());
        }
    }
    headers
}

/// Walk the section grouping lines under numbered instances.
///
/// Every occurrence of a known sub-header is a block boundary; occurrence
/// counting is per header name, so `X … Y … X` yields `X 1` and `X 2` even
/// though the occurrences are not adjacent. The header line itself belongs
/// to its instance (it may carry data cells).
fn group_instances<'a>(
    lines: &[&'a str],
    delimiter: Delimiter,
    headers: &BTreeSet<String>,
) -> BTreeMap<String, Vec<(String, Vec<&'a str>)>> {
    let mut result: BTreeMap<String, Vec<(String, Vec<&'a str>)>> = BTreeMap::new();
    let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
    let mut current: Option<(String, String, Vec<&'a str>)> = None;

    for line in lines {
        let cells: Vec<&str> = line.split(delimiter.as_char()).collect();
        let key = cells.get(SUB_HEADER_COLUMN).copied().unwrap_or_default();

        if cells.len() > SUB_HEADER_COLUMN && headers.contains(key) {
            if let Some((header, label, block)) = current.take() {
                result.entry(header).or_default().push((label, block));
            }
            let count = occurrences.entry(key.to_string()).or_insert(0);
            *count += 1;
            let label = format!("{key} {count}");
            current = Some((key.to_string(), label, vec![line]));
        } else if let Some((_, _, block)) = &mut current {
            block.push(line);
        }
    }
    if let Some((header, label, block)) = current {
        result.entry(header).or_default().push((label, block));
    }
    result
}

fn parse_instance(
    lines: &[&str],
    delimiter: Delimiter,
    header: &str,
    label: &str,
    events: &mut Vec<Event>,
) {
    let mut current_timestamp = None;
    let mut text_buffer: Vec<String> = Vec::new();

    for line in lines {
        let cells: Vec<&str> = line.split(delimiter.as_char()).collect();

        if let Some(timestamp) = find_timestamp(&cells) {
            flush_text(&mut text_buffer, current_timestamp, header, label, events);
            current_timestamp = Some(timestamp);
        }

        if is_key_value_row(&cells) {
            flush_text(&mut text_buffer, current_timestamp, header, label, events);
            if let Some(timestamp) = current_timestamp {
                events.push(Event {
                    timestamp,
                    category: label.to_string(),
                    parameter: cells[KV_PARAMETER_COLUMN].trim().to_string(),
                    value: Value::parse_cell(cells[KV_VALUE_COLUMN]),
                    source_type: header.to_string(),
                    source_header: Some(header.to_string()),
                });
            }
            continue;
        }

        for cell in &cells {
            let fragment = cell.trim();
            if fragment.is_empty() || is_filtered_fragment(fragment, header) {
                continue;
            }
            let cleaned = fragment.trim_matches('"').trim();
            if !cleaned.is_empty() {
                text_buffer.push(cleaned.to_string());
            }
        }
    }
    flush_text(&mut text_buffer, current_timestamp, header, label, events);
}

fn is_key_value_row(cells: &[&str]) -> bool {
    cells.len() > KV_VALUE_COLUMN
        && !cells[KV_PARAMETER_COLUMN].trim().is_empty()
        && !cells[KV_VALUE_COLUMN].trim().is_empty()
        && cells[SUB_HEADER_COLUMN].trim().is_empty()
}

/// Fragments that restate the sub-header, carry a timestamp, name an
/// author, or are notes-caption boilerplate do not belong to the narrative.
fn is_filtered_fragment(fragment: &str, header: &str) -> bool {
    if fragment == header || (fragment.contains(header) && fragment.len() < header.len() + 5) {
        return true;
    }
    if TIMESTAMP_PATTERN.is_match(fragment) {
        return true;
    }
    if AUTHOR_INITIALS.is_match(fragment) {
        return true;
    }
    fragment.contains(NOTES_CAPTION) && fragment.len() < BOILERPLATE_MAX_LEN
}

/// Emit the accumulated free text as one event at the current timestamp.
/// A buffer that is a single numeric string becomes a numeric value.
fn flush_text(
    buffer: &mut Vec<String>,
    timestamp: Option<chrono::NaiveDateTime>,
    header: &str,
    label: &str,
    events: &mut Vec<Event>,
) {
    if buffer.is_empty() {
        return;
    }
    let joined = buffer.join("\n");
    buffer.clear();
    let Some(timestamp) = timestamp else {
        return;
    };
    events.push(Event {
        timestamp,
        category: label.to_string(),
        parameter: header.to_string(),
        value: Value::parse_cell(&joined),
        source_type: header.to_string(),
        source_header: Some(header.to_string()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_sub_headers_open_numbered_instances() {
        let text = "\
;;ECMO;;;;;;;;\n\
;;;01.09.25 10:00;;;;;;\n\
;;;;Drehzahl;;;;;3000\n\
;;GCS (Jugendliche und Erwachsene);;;;;;;;\n\
;;;01.09.25 11:00;;;;;;\n\
;;;;Summe GCS2;;;;;7\n\
;;ECMO;;;;;;;;\n\
;;;02.09.25 10:00;;;;;;\n\
;;;;Drehzahl;;;;;3200";
        let events = parse_patient_data(text, Delimiter::Semicolon);
        let ecmo: Vec<&Event> = events.iter().filter(|e| e.source_type == "ECMO").collect();
        assert_eq!(ecmo.len(), 2);
        assert_eq!(ecmo[0].category, "ECMO 1");
        assert_eq!(ecmo[1].category, "ECMO 2");
        assert_eq!(ecmo[1].value, Value::Number(3200.0));
        assert!(events.iter().any(|e| e.parameter == "Summe GCS2"));
    }

    #[test]
    fn key_value_rows_use_the_dedicated_columns() {
        let text = "\
;;Impella CP;;;;;;;;\n\
;;;05.09.25 08:30;;;;;;\n\
;;;;HZV;;;;;3,4";
        let events = parse_patient_data(text, Delimiter::Semicolon);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].parameter, "HZV");
        assert_eq!(events[0].value, Value::Number(3.4));
        assert_eq!(events[0].source_header.as_deref(), Some("Impella CP"));
    }

    #[test]
    fn free_text_rows_concatenate_per_timestamp() {
        let text = "\
;;Arztnotizen Intensiv;;;;;;;;\n\
;;;03.09.25 14:00;;;;;;\n\
;;;;Patient stabil;;;;;\n\
;;;;F. K.;;;;;\n\
;;;;weitere Eskalation nicht notwendig;;;;;";
        let events = parse_patient_data(text, Delimiter::Semicolon);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].value,
            Value::Text("Patient stabil\nweitere Eskalation nicht notwendig".to_string())
        );
    }

    #[test]
    fn lone_numeric_note_becomes_a_number() {
        let text = "\
;;ACT;;;;;;;;\n\
;;;04.09.25 06:00;;;;;;\n\
;;;;180;;;;;";
        let events = parse_patient_data(text, Delimiter::Semicolon);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].value, Value::Number(180.0));
        assert_eq!(events[0].parameter, "ACT");
    }
}
