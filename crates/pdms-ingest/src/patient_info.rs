//! Patient-info header parser.
//!
//! The demographics live in the report masthead, before any section header
//! and therefore before cleaning: this parser reads the raw text. It
//! resolves the report-period start as the timestamp for the static
//! demographic events and derives BMI from height and weight.

use pdms_model::{Event, Value};
use regex::Regex;
use std::sync::LazyLock;

use crate::delimiter::Delimiter;
use crate::timestamp::parse_timestamp;

/// The masthead must appear within this many lines from the top.
const HEADER_SCAN_LINES: usize = 100;

/// Event tags for the static demographics.
pub const SOURCE_TYPE: &str = "PatientInfo";
const CATEGORY: &str = "Patientenstamm";

/// Report period, e.g. `10.09.2025 11:53 - 30.09.2025 01:45`.
static REPORT_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}\.\d{2}\.\d{4}\s+\d{2}:\d{2})\s*-\s*\d{2}\.\d{2}\.\d{4}")
        .expect("report period pattern")
});

static ANY_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\.\d{2}\.\d{4}\s+\d{2}:\d{2}").expect("bare timestamp pattern")
});

/// Masthead column label → emitted parameter name, with the unit suffix
/// stripped from the value.
const FIELDS: [(&str, &str, &str); 6] = [
    ("Alter", "Alter", "J"),
    ("Gewicht", "Gewicht", "kg"),
    ("Größe", "Größe", "cm"),
    ("Körperoberfläche", "Körperoberfläche (BSA)", "m²"),
    ("Fall-ID", "Fall-ID", ""),
    ("Pat.-ID", "Patienten-ID", ""),
];

/// Extract the static demographic events plus a derived BMI.
///
/// Yields nothing when no report-period timestamp resolves: demographic
/// rows may never enter the table with a fabricated time.
pub fn parse_patient_info(raw: &str, delimiter: Delimiter) -> Vec<Event> {
    let lines: Vec<&str> = raw.lines().take(HEADER_SCAN_LINES).collect();

    let Some(timestamp) = period_start(&lines) else {
        tracing::warn!("no report-period timestamp in the masthead; dropping demographics");
        return Vec::new();
    };
    let Some((header_line, values_line)) = demographics_rows(&lines) else {
        return Vec::new();
    };

    let header_cells: Vec<&str> = header_line.split(delimiter.as_char()).collect();
    let value_cells: Vec<&str> = values_line.split(delimiter.as_char()).collect();

    let mut events = Vec::new();
    let mut height_cm = None;
    let mut weight_kg = None;

    for (index, header_cell) in header_cells.iter().enumerate() {
        let Some((_, parameter, unit)) = FIELDS
            .iter()
            .find(|(label, _, _)| *label == header_cell.trim())
        else {
            continue;
        };
        let Some(raw_value) = value_cells.get(index).map(|cell| cell.trim()) else {
            continue;
        };
        if raw_value.is_empty() {
            continue;
        }
        let cleaned = strip_unit(raw_value, unit);
        let value = Value::parse_cell(&cleaned);
        match (*parameter, value.as_number()) {
            ("Größe", Some(height)) => height_cm = Some(height),
            ("Gewicht", Some(weight)) => weight_kg = Some(weight),
            _ => {}
        }
        events.push(Event {
            timestamp,
            category: CATEGORY.to_string(),
            parameter: (*parameter).to_string(),
            value,
            source_type: SOURCE_TYPE.to_string(),
            source_header: None,
        });
    }

    if let (Some(height), Some(weight)) = (height_cm, weight_kg)
        && height > 0.0
    {
        let meters = height / 100.0;
        let bmi = (weight / (meters * meters) * 100.0).round() / 100.0;
        events.push(Event {
            timestamp,
            category: CATEGORY.to_string(),
            parameter: "BMI".to_string(),
            value: Value::Number(bmi),
            source_type: SOURCE_TYPE.to_string(),
            source_header: None,
        });
    }
    events
}

fn period_start(lines: &[&str]) -> Option<chrono::NaiveDateTime> {
    for line in lines {
        if let Some(captures) = REPORT_PERIOD.captures(line) {
            return parse_timestamp(&captures[1]);
        }
    }
    // Fall back to the first bare four-digit-year timestamp.
    for line in lines {
        if let Some(found) = ANY_TIMESTAMP.find(line) {
            return parse_timestamp(found.as_str());
        }
    }
    None
}

/// The demographics header row names case id, height and weight together;
/// the values sit in the following line.
fn demographics_rows<'a>(lines: &[&'a str]) -> Option<(&'a str, &'a str)> {
    lines
        .iter()
        .enumerate()
        .find(|(_, line)| {
            line.contains("Fall-ID") && line.contains("Größe") && line.contains("Gewicht")
        })
        .and_then(|(index, line)| Some((*line, *lines.get(index + 1)?)))
}

fn strip_unit(raw: &str, unit: &str) -> String {
    if unit.is_empty() {
        return raw.to_string();
    }
    let lowered = raw.to_lowercase();
    let mut cleaned = lowered.replace(&unit.to_lowercase(), "");
    if unit == "m²" {
        cleaned = cleaned.replace("m2", "");
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const MASTHEAD: &str = "\
Ausdruck: Gesamte Akte;10.09.2025 11:53 - 30.09.2025 01:45;;\n\
Universitätsklinikum;;;\n\
Pat.-ID;Fall-ID;Alter;Größe;Gewicht;Körperoberfläche\n\
12345;67890;58 J;183 cm;80 kg;2,02 m²";

    #[test]
    fn emits_demographics_at_the_period_start() {
        let events = parse_patient_info(MASTHEAD, Delimiter::Semicolon);
        let expected = NaiveDate::from_ymd_opt(2025, 9, 10)
            .unwrap()
            .and_hms_opt(11, 53, 0)
            .unwrap();
        assert!(events.iter().all(|event| event.timestamp == expected));
        let weight = events.iter().find(|e| e.parameter == "Gewicht").unwrap();
        assert_eq!(weight.value, Value::Number(80.0));
        let age = events.iter().find(|e| e.parameter == "Alter").unwrap();
        assert_eq!(age.value, Value::Number(58.0));
    }

    #[test]
    fn derives_bmi_from_height_and_weight() {
        let events = parse_patient_info(MASTHEAD, Delimiter::Semicolon);
        let bmi = events.iter().find(|e| e.parameter == "BMI").unwrap();
        // 80 / 1.83² = 23.888… → rounded to 2 decimals
        assert_eq!(bmi.value, Value::Number(23.89));
    }

    #[test]
    fn no_timestamp_means_no_demographics() {
        let raw = "Pat.-ID;Fall-ID;Alter;Größe;Gewicht;Körperoberfläche\n1;2;58 J;183 cm;80 kg;2 m²";
        assert!(parse_patient_info(raw, Delimiter::Semicolon).is_empty());
    }
}
