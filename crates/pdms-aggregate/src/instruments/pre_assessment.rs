//! Pre-implantation assessment builder.
//!
//! Unlike the daily instruments this one is anchored at the implantation
//! timestamp: every value is the observation closest *before* the anchor
//! within a bounded window. Blood gas, ventilation, hemodynamics and
//! neurology use a 6 h window; labs fall back to 24 h (flagged on the
//! record); medication presence and doses look back 24 h.

use chrono::{NaiveDateTime, TimeDelta};
use pdms_model::{
    AggregationContext, Event, EventTable, PreAssessmentRecord, RecordKey,
};

use crate::dose::{DoseNormalizer, Substance};
use crate::engine::CompiledMapping;
use crate::registry::{HEMODYNAMICS_FIELDS, LAB_FIELDS, VASOACTIVE_SPEC, normalize_vent_mode};

/// Default window for bedside observations.
const OBSERVATION_WINDOW_HOURS: i64 = 6;
/// Extended window for labs and the medication lookback.
const EXTENDED_WINDOW_HOURS: i64 = 24;

const BGA_TARGETS: [&str; 11] = [
    "pco2", "po2", "ph", "hco3", "base_excess", "potassium", "sodium", "sao2", "glucose",
    "lactate", "svo2",
];
const LAB_TARGETS: [&str; 16] = [
    "wbc", "hb", "hct", "platelets", "ptt", "quick", "inr", "ck", "got", "ldh", "creatinine",
    "urea", "albumin", "crp", "pct", "act",
];

/// Build the pre-implantation snapshot for one arm.
///
/// `key.day_index` is unused here (the record is not day-scoped); only the
/// record id and arm carry over.
pub fn build_pre_assessment_record(
    table: &EventTable,
    anchor: NaiveDateTime,
    key: &RecordKey,
    context: &AggregationContext,
) -> PreAssessmentRecord {
    let mut record = PreAssessmentRecord::new(key.record_id.clone(), key.arm, anchor);

    let vitals = window_events(table, "Vitals", anchor, OBSERVATION_WINDOW_HOURS);
    let respiratory = window_events(table, "Respiratory", anchor, OBSERVATION_WINDOW_HOURS);
    let o2 = window_events(table, "O2 Gabe", anchor, OBSERVATION_WINDOW_HOURS);
    let lab_6h = window_events(table, "Lab", anchor, OBSERVATION_WINDOW_HOURS);
    let lab_24h = window_events(table, "Lab", anchor, EXTENDED_WINDOW_HOURS);
    let act_6h = window_events(table, "ACT", anchor, OBSERVATION_WINDOW_HOURS);
    let act_24h = window_events(table, "ACT", anchor, EXTENDED_WINDOW_HOURS);
    let gcs_source = window_events(
        table,
        "GCS (Jugendliche und Erwachsene)",
        anchor,
        OBSERVATION_WINDOW_HOURS,
    );
    let medication = window_events(table, "Medication", anchor, EXTENDED_WINDOW_HOURS);

    // Blood gas: closest value per analyte, tracking the latest draw time.
    let mut latest_draw: Option<NaiveDateTime> = None;
    for target in BGA_TARGETS {
        let Some(mapping) = LAB_FIELDS.get(target) else {
            continue;
        };
        if let Some((value, timestamp)) = closest_before(&lab_6h, mapping) {
            assign_bga(&mut record, target, value);
            latest_draw = Some(latest_draw.map_or(timestamp, |seen| seen.max(timestamp)));
        }
    }
    if let Some(draw) = latest_draw {
        record.assess_date = Some(draw.date());
        record.assess_time = Some(draw.time());
    }

    // Ventilation
    for target in ["fio2", "peep", "pip", "vent_rate"] {
        let Some(mapping) = HEMODYNAMICS_FIELDS.get(target) else {
            continue;
        };
        if let Some((value, _)) = closest_before(&respiratory, mapping) {
            assign_vent(&mut record, target, value);
        }
    }
    if let Some(mapping) = HEMODYNAMICS_FIELDS.get("o2_flow")
        && let Some((value, _)) = closest_before(&o2, mapping)
    {
        record.o2_flow = Some(value);
    }
    if let Some(mapping) = HEMODYNAMICS_FIELDS.get("vent_mode") {
        record.vent_mode = closest_text_before(&respiratory, mapping)
            .as_deref()
            .and_then(normalize_vent_mode);
    }

    // Hemodynamics
    for target in [
        "heart_rate",
        "sys_bp",
        "dia_bp",
        "mean_bp",
        "cvp",
        "spo2",
        "pcwp",
        "sys_pap",
        "dia_pap",
        "mean_pap",
        "cardiac_index",
    ] {
        let Some(mapping) = HEMODYNAMICS_FIELDS.get(target) else {
            continue;
        };
        if let Some((value, _)) = closest_before(&vitals, mapping) {
            assign_hemo(&mut record, target, value);
        }
    }

    // Neurology
    if let Some(mapping) = HEMODYNAMICS_FIELDS.get("gcs")
        && let Some((value, _)) = closest_before(&gcs_source, mapping)
    {
        record.gcs = Some(value);
    }

    // Labs: 6 h first, 24 h fallback flagged on the record.
    for target in LAB_TARGETS {
        let Some(mapping) = LAB_FIELDS.get(target) else {
            continue;
        };
        let (narrow, wide): (&[&Event], &[&Event]) = if target == "act" {
            (&act_6h, &act_24h)
        } else {
            (&lab_6h, &lab_24h)
        };
        let value = match closest_before(narrow, mapping) {
            Some((value, _)) => Some(value),
            None => {
                let fallback = closest_before(wide, mapping);
                if fallback.is_some() {
                    record.lab_window_extended = true;
                }
                fallback.map(|(value, _)| value)
            }
        };
        if let Some(value) = value {
            assign_lab(&mut record, target, value);
        }
    }

    // Medication presence and doses over the 24 h lookback.
    let normalizer = DoseNormalizer::new();
    for (id, pattern) in VASOACTIVE_SPEC.iter() {
        let present = medication.iter().any(|event| {
            pattern.is_match(&event.parameter) && !normalizer.is_bolus(&event.parameter)
        });
        if present {
            record.vasoactive_spec.insert(*id);
        }
    }
    for substance in Substance::ALL {
        let dose = closest_dose(&medication, substance, &normalizer, context, table);
        match substance {
            Substance::Norepinephrine => record.norepinephrine = dose,
            Substance::Epinephrine => record.epinephrine = dose,
            Substance::Dobutamine => record.dobutamine = dose,
            Substance::Milrinone => record.milrinone = dose,
            Substance::Vasopressin => record.vasopressin = dose,
        }
    }

    record.apply_derived_fields();
    record
}

/// Events of one source inside `[anchor - hours, anchor]`.
fn window_events<'a>(
    table: &'a EventTable,
    source: &str,
    anchor: NaiveDateTime,
    hours: i64,
) -> Vec<&'a Event> {
    let start = anchor - TimeDelta::hours(hours);
    let needle = source.to_lowercase();
    table
        .events()
        .iter()
        .filter(|event| {
            event.timestamp >= start
                && event.timestamp <= anchor
                && event.source_type.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Latest matching numeric value at or before the anchor.
fn closest_before(events: &[&Event], mapping: &CompiledMapping) -> Option<(f64, NaiveDateTime)> {
    events
        .iter()
        .filter(|event| mapping.matches(event))
        .filter_map(|event| event.value.as_number().map(|value| (value, event.timestamp)))
        .max_by_key(|(_, timestamp)| *timestamp)
}

/// Latest matching textual value at or before the anchor.
fn closest_text_before(events: &[&Event], mapping: &CompiledMapping) -> Option<String> {
    events
        .iter()
        .filter(|event| mapping.matches(event))
        .max_by_key(|event| event.timestamp)
        .map(|event| event.value.to_string())
}

/// Dose derived from the administration closest to the anchor.
fn closest_dose(
    medication: &[&Event],
    substance: Substance,
    normalizer: &DoseNormalizer,
    context: &AggregationContext,
    table: &EventTable,
) -> Option<f64> {
    let pattern = crate::engine::case_insensitive(substance.pattern());
    let closest = medication
        .iter()
        .copied()
        .filter(|event| pattern.is_match(&event.parameter) && !normalizer.is_bolus(&event.parameter))
        .max_by_key(|event| event.timestamp)?;
    normalizer.infusion_dose(&[closest], substance, context, table)
}

fn assign_bga(record: &mut PreAssessmentRecord, target: &str, value: f64) {
    match target {
        "pco2" => record.pco2 = Some(value),
        "po2" => record.po2 = Some(value),
        "ph" => record.ph = Some(value),
        "hco3" => record.hco3 = Some(value),
        "base_excess" => record.base_excess = Some(value),
        "potassium" => record.potassium = Some(value),
        "sodium" => record.sodium = Some(value),
        "sao2" => record.sao2 = Some(value),
        "glucose" => record.glucose = Some(value),
        "lactate" => record.lactate = Some(value),
        "svo2" => record.svo2 = Some(value),
        other => unreachable!("unmapped blood-gas target {other}"),
    }
}

fn assign_vent(record: &mut PreAssessmentRecord, target: &str, value: f64) {
    match target {
        "fio2" => record.fio2 = Some(value),
        "peep" => record.peep = Some(value),
        "pip" => record.pip = Some(value),
        "vent_rate" => record.vent_rate = Some(value),
        other => unreachable!("unmapped ventilation target {other}"),
    }
}

fn assign_hemo(record: &mut PreAssessmentRecord, target: &str, value: f64) {
    match target {
        "heart_rate" => record.heart_rate = Some(value),
        "sys_bp" => record.sys_bp = Some(value),
        "dia_bp" => record.dia_bp = Some(value),
        "mean_bp" => record.mean_bp = Some(value),
        "cvp" => record.cvp = Some(value),
        "spo2" => record.spo2 = Some(value),
        "pcwp" => record.pcwp = Some(value),
        "sys_pap" => record.sys_pap = Some(value),
        "dia_pap" => record.dia_pap = Some(value),
        "mean_pap" => record.mean_pap = Some(value),
        "cardiac_index" => record.cardiac_index = Some(value),
        other => unreachable!("unmapped hemodynamics target {other}"),
    }
}

fn assign_lab(record: &mut PreAssessmentRecord, target: &str, value: f64) {
    match target {
        "wbc" => record.wbc = Some(value),
        "hb" => record.hb = Some(value),
        "hct" => record.hct = Some(value),
        "platelets" => record.platelets = Some(value),
        "ptt" => record.ptt = Some(value),
        "quick" => record.quick = Some(value),
        "inr" => record.inr = Some(value),
        "ck" => record.ck = Some(value),
        "got" => record.got = Some(value),
        "ldh" => record.ldh = Some(value),
        "creatinine" => record.creatinine = Some(value),
        "urea" => record.urea = Some(value),
        "albumin" => record.albumin = Some(value),
        "crp" => record.crp = Some(value),
        "pct" => record.pct = Some(value),
        "act" => record.act = Some(value),
        other => unreachable!("unmapped lab target {other}"),
    }
}
