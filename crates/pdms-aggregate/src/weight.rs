//! Patient body-weight resolution.
//!
//! Dose normalization needs the weight in kg. It is read from the
//! demographic events of the export (`PatientInfo`, or the bedside
//! `Grösse/Gewicht` documentation block) and guarded by a plausibility
//! window so a mis-parsed cell can never silently skew every dose.

use pdms_model::EventTable;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Weights outside this open interval (kg) are treated as parse errors.
pub const MIN_PLAUSIBLE_KG: f64 = 20.0;
pub const MAX_PLAUSIBLE_KG: f64 = 300.0;

static WEIGHT_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)PatientInfo|Grösse/Gewicht").expect("weight source pattern")
});

static WEIGHT_PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Gewicht(?:\s*/\s*kg)?$").expect("weight parameter pattern")
});

/// First plausible weight found in the table, if any.
pub fn resolve_patient_weight(table: &EventTable) -> Option<f64> {
    for event in table.events() {
        if !WEIGHT_SOURCE.is_match(&event.source_type)
            || !WEIGHT_PARAMETER.is_match(&event.parameter)
        {
            continue;
        }
        let candidate = match event.value.as_number() {
            Some(number) => Some(number),
            None => event
                .value
                .as_text()
                .and_then(|text| text.trim().replace(',', ".").parse::<f64>().ok()),
        };
        match candidate {
            Some(weight) if weight > MIN_PLAUSIBLE_KG && weight < MAX_PLAUSIBLE_KG => {
                return Some(weight);
            }
            Some(weight) => {
                warn!(weight, "implausible patient weight ignored");
            }
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pdms_model::{Event, Value};

    fn weight_event(value: Value) -> Event {
        Event {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            category: "Patientenstamm".to_string(),
            parameter: "Gewicht".to_string(),
            value,
            source_type: "PatientInfo".to_string(),
            source_header: None,
        }
    }

    #[test]
    fn resolves_numeric_weight() {
        let table = EventTable::new(vec![weight_event(Value::Number(80.0))]);
        assert_eq!(resolve_patient_weight(&table), Some(80.0));
    }

    #[test]
    fn rejects_implausible_values_then_accepts_a_later_one() {
        let table = EventTable::new(vec![
            weight_event(Value::Number(8000.0)),
            weight_event(Value::Number(82.5)),
        ]);
        assert_eq!(resolve_patient_weight(&table), Some(82.5));
    }

    #[test]
    fn no_weight_event_means_none() {
        let table = EventTable::new(vec![]);
        assert_eq!(resolve_patient_weight(&table), None);
    }
}
