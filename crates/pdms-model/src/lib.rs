pub mod context;
pub mod event;
pub mod mapping;
pub mod records;

pub use context::{AggregationContext, AggregationStrategy};
pub use event::{Event, EventTable, Value};
pub use mapping::FieldMapping;
pub use records::{
    Anticoagulant, Arm, HemodynamicsRecord, ImpellaRecord, LabRecord, PreAssessmentRecord,
    PumpRecord, RecordKey, VentMode, VentilationCategory,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn event_serializes_with_untagged_value() {
        let event = Event {
            timestamp: NaiveDate::from_ymd_opt(2025, 9, 10)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            category: "Blutgase arteriell".to_string(),
            parameter: "LACTAT [mmol/l]".to_string(),
            value: Value::Number(3.1),
            source_type: "Lab".to_string(),
            source_header: None,
        };
        let json = serde_json::to_string(&event).expect("serialize event");
        assert!(json.contains("\"value\":3.1"));
        let round: Event = serde_json::from_str(&json).expect("deserialize event");
        assert_eq!(round, event);
    }

    #[test]
    fn record_key_round_trips() {
        let key = RecordKey::new("r-001", Arm::Impella, 3);
        let json = serde_json::to_string(&key).expect("serialize key");
        let round: RecordKey = serde_json::from_str(&json).expect("deserialize key");
        assert_eq!(round, key);
    }
}
