//! ECMO pump record builder.

use chrono::NaiveDate;
use pdms_model::{AggregationContext, EventTable, PumpRecord, RecordKey};

use crate::engine::{day_events, select_value};
use crate::registry::PUMP_FIELDS;

/// Aggregate one day of ECMO pump settings. Only meaningful for the ECLS
/// arm; the caller decides whether the instrument applies.
pub fn build_pump_record(
    table: &EventTable,
    day: NaiveDate,
    key: RecordKey,
    context: &AggregationContext,
) -> PumpRecord {
    let mut record = PumpRecord::new(key, day);
    let ecmo = day_events(table, day, "ECMO");

    for mapping in PUMP_FIELDS.iter() {
        let value = select_value(&ecmo, mapping, context);
        match mapping.target {
            "rpm" => record.rpm = value,
            "blood_flow" => record.blood_flow = value,
            "gas_flow" => record.gas_flow = value,
            "fio2" => record.fio2 = value,
            other => unreachable!("unmapped pump target {other}"),
        }
    }
    record
}
