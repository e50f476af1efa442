//! Normalized long-format event stream.
//!
//! Every section parser emits [`Event`] rows with the same shape; the
//! aggregation layer consumes nothing else. Timestamps are always present —
//! rows that fail to resolve one are dropped during parsing, never carried
//! as nulls.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell value: numeric where the source cell parses as a number
/// (comma-as-decimal-separator convention), free text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Coerce a raw cell into a value. `"36,5"` parses as `36.5`; cells that
    /// fail numeric conversion are retained as trimmed text.
    pub fn parse_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.replace(',', ".").parse::<f64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One normalized observation recovered from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Observation time, minute precision.
    pub timestamp: NaiveDateTime,
    /// Section-local grouping, e.g. a lab sub-panel or a device instance
    /// label such as `"ECMO 2"`.
    pub category: String,
    /// Measurement or drug name as printed in the export.
    pub parameter: String,
    pub value: Value,
    /// Tag identifying the originating section or device.
    pub source_type: String,
    /// Raw origin label where one exists: the device sub-header for nested
    /// blocks, the time-range column label for fluid-balance cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_header: Option<String>,
}

/// The canonical event table: append-only while parsing, read-only during
/// aggregation. Rows are kept sorted by timestamp (stable, so same-minute
/// rows preserve parse order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {
    pub fn new(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|event| event.timestamp);
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events observed on the given calendar day.
    pub fn on_day(&self, day: NaiveDate) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |event| event.timestamp.date() == day)
    }

    /// Events whose source tag contains `source`, case-insensitively.
    /// Device tags vary across exports (`"Impella CP"`, `"Impella 5.5"`),
    /// so substring matching is the lookup contract.
    pub fn from_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Event> {
        let needle = source.to_lowercase();
        self.events
            .iter()
            .filter(move |event| event.source_type.to_lowercase().contains(&needle))
    }

    /// The distinct calendar days covered by the table, ascending.
    pub fn available_days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self
            .events
            .iter()
            .map(|event| event.timestamp.date())
            .collect();
        days.sort();
        days.dedup();
        days
    }

    /// First and last covered day, if any events exist.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.events.first()?.timestamp.date();
        let last = self.events.last()?.timestamp.date();
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(day: u32, hour: u32, source: &str) -> Event {
        Event {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            category: "cat".to_string(),
            parameter: "param".to_string(),
            value: Value::Number(1.0),
            source_type: source.to_string(),
            source_header: None,
        }
    }

    #[test]
    fn parse_cell_comma_decimal() {
        assert_eq!(Value::parse_cell(" 36,5 "), Value::Number(36.5));
        assert_eq!(Value::parse_cell("70"), Value::Number(70.0));
        assert_eq!(
            Value::parse_cell("Sinusrhythmus"),
            Value::Text("Sinusrhythmus".to_string())
        );
    }

    #[test]
    fn table_sorts_and_filters_by_day() {
        let table = EventTable::new(vec![event(2, 8, "Vitals"), event(1, 9, "Vitals")]);
        assert_eq!(
            table.events()[0].timestamp.date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            table
                .on_day(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .count(),
            1
        );
        assert_eq!(table.available_days().len(), 2);
    }

    #[test]
    fn source_lookup_is_case_insensitive_substring() {
        let table = EventTable::new(vec![event(1, 8, "Impella CP 1")]);
        assert_eq!(table.from_source("impella").count(), 1);
        assert_eq!(table.from_source("ECMO").count(), 0);
    }
}
