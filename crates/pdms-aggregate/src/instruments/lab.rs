//! Laboratory record builder.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pdms_model::{AggregationContext, Event, EventTable, LabRecord, RecordKey};

use crate::engine::{day_events, select_value};
use crate::registry::LAB_FIELDS;

use super::dual_support;

/// Aggregate one day of laboratory values.
pub fn build_lab_record(
    table: &EventTable,
    day: NaiveDate,
    key: RecordKey,
    context: &AggregationContext,
) -> LabRecord {
    let mut record = LabRecord::new(key, day);
    record.dual_support = dual_support(table, day);

    // Events are pulled once per distinct source, not once per field.
    let mut by_source: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for mapping in LAB_FIELDS.iter() {
        let events = by_source
            .entry(mapping.source)
            .or_insert_with(|| day_events(table, day, mapping.source));
        let value = select_value(events, mapping, context);
        match mapping.target {
            "pco2" => record.pco2 = value,
            "po2" => record.po2 = value,
            "ph" => record.ph = value,
            "hco3" => record.hco3 = value,
            "base_excess" => record.base_excess = value,
            "sao2" => record.sao2 = value,
            "potassium" => record.potassium = value,
            "sodium" => record.sodium = value,
            "glucose" => record.glucose = value,
            "lactate" => record.lactate = value,
            "svo2" => record.svo2 = value,
            "wbc" => record.wbc = value,
            "hb" => record.hb = value,
            "hct" => record.hct = value,
            "platelets" => record.platelets = value,
            "free_hb" => record.free_hb = value,
            "ptt" => record.ptt = value,
            "quick" => record.quick = value,
            "inr" => record.inr = value,
            "act" => record.act = value,
            "ck" => record.ck = value,
            "ck_mb" => record.ck_mb = value,
            "ggt" => record.ggt = value,
            "ldh" => record.ldh = value,
            "lipase" => record.lipase = value,
            "got" => record.got = value,
            "gpt" => record.gpt = value,
            "pct" => record.pct = value,
            "crp" => record.crp = value,
            "bilirubin" => record.bilirubin = value,
            "creatinine" => record.creatinine = value,
            "creatinine_clearance" => record.creatinine_clearance = value,
            "urea" => record.urea = value,
            "albumin" => record.albumin = value,
            "haptoglobin" => record.haptoglobin = value,
            other => unreachable!("unmapped lab target {other}"),
        }
    }

    record.apply_derived_fields();
    record
}
