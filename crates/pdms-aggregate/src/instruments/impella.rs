//! Impella assessment record builder.

use chrono::NaiveDate;
use pdms_model::{AggregationContext, Event, EventTable, ImpellaRecord, RecordKey};
use regex::Regex;
use std::sync::LazyLock;

use crate::engine::{case_insensitive, day_events, select_value};
use crate::registry::IMPELLA_FIELDS;

/// Flow-regulation parameter carrying the performance level.
static FLOW_REGULATION: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"Flu.*regelung|Fluss.*regelung"));

/// Performance level inside the setting text, e.g. `"P8"`.
static P_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"P(\d+)"));

/// Aggregate one day of Impella parameters. Only meaningful for the
/// Impella arm; the caller decides whether the instrument applies.
pub fn build_impella_record(
    table: &EventTable,
    day: NaiveDate,
    key: RecordKey,
    context: &AggregationContext,
) -> ImpellaRecord {
    let mut record = ImpellaRecord::new(key, day);
    let impella = day_events(table, day, "Impella");

    for mapping in IMPELLA_FIELDS.iter() {
        let value = select_value(&impella, mapping, context);
        match mapping.target {
            "flow" => record.flow = value,
            "purge_flow" => record.purge_flow = value,
            "purge_pressure" => record.purge_pressure = value,
            other => unreachable!("unmapped impella target {other}"),
        }
    }
    record.p_level = p_level(&impella);
    record
}

fn p_level(impella: &[&Event]) -> Option<u8> {
    impella
        .iter()
        .filter(|event| FLOW_REGULATION.is_match(&event.parameter))
        .find_map(|event| {
            let text = event.value.to_string();
            P_LEVEL
                .captures(&text)
                .and_then(|captures| captures[1].parse().ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdms_model::Value;

    #[test]
    fn p_level_is_parsed_from_the_flow_regulation_text() {
        let event = Event {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            category: "Impella CP 1".to_string(),
            parameter: "Flußregelung".to_string(),
            value: Value::Text("P8".to_string()),
            source_type: "Impella CP".to_string(),
            source_header: Some("Impella CP".to_string()),
        };
        assert_eq!(p_level(&[&event]), Some(8));
    }
}
