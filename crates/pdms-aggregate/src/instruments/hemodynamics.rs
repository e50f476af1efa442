//! Hemodynamics / ventilation / medication record builder.
//!
//! The widest instrument: vitals and ventilation through the mapping
//! table, neurology scores from their own device sources, continuous
//! catecholamine doses through the dose normalizer, and the medication
//! checkbox groups over the day's drug names.

use chrono::NaiveDate;
use pdms_model::{
    AggregationContext, Event, EventTable, HemodynamicsRecord, RecordKey,
};
use regex::Regex;

use crate::dose::{DoseNormalizer, Substance};
use crate::engine::{case_insensitive, day_events, select_text, select_value};
use crate::registry::{
    ANTIBIOTICS, ANTICOAGULANTS, ANTIPLATELETS, ENTERAL_CATEGORY_PATTERN, HEMODYNAMICS_FIELDS,
    TRANSFUSION_PATTERNS, VASOACTIVE_SPEC, normalize_vent_mode,
};

use super::dual_support;

/// Aggregate one day of hemodynamics, ventilation and medication.
pub fn build_hemodynamics_record(
    table: &EventTable,
    day: NaiveDate,
    key: RecordKey,
    context: &AggregationContext,
) -> HemodynamicsRecord {
    let mut record = HemodynamicsRecord::new(key, day);
    record.dual_support = dual_support(table, day);

    let vitals = day_events(table, day, "Vitals");
    let respiratory = day_events(table, day, "Respiratory");
    let o2 = day_events(table, day, "O2 Gabe");
    let rass_source = day_events(table, day, "Richmond-Agitation-Sedation");
    let gcs_source = day_events(table, day, "GCS (Jugendliche und Erwachsene)");
    let medication = day_events(table, day, "Medication");

    for mapping in HEMODYNAMICS_FIELDS.iter() {
        let events: &[&Event] = match mapping.source {
            "Vitals" => &vitals,
            "Respiratory" => &respiratory,
            "O2 Gabe" => &o2,
            "Richmond" => &rass_source,
            "GCS" => &gcs_source,
            other => unreachable!("unmapped hemodynamics source {other}"),
        };
        match mapping.target {
            "heart_rate" => record.heart_rate = select_value(events, mapping, context),
            "sys_bp" => record.sys_bp = select_value(events, mapping, context),
            "dia_bp" => record.dia_bp = select_value(events, mapping, context),
            "mean_bp" => record.mean_bp = select_value(events, mapping, context),
            "cvp" => record.cvp = select_value(events, mapping, context),
            "spo2" => record.spo2 = select_value(events, mapping, context),
            "pcwp" => record.pcwp = select_value(events, mapping, context),
            "sys_pap" => record.sys_pap = select_value(events, mapping, context),
            "dia_pap" => record.dia_pap = select_value(events, mapping, context),
            "mean_pap" => record.mean_pap = select_value(events, mapping, context),
            "cardiac_index" => record.cardiac_index = select_value(events, mapping, context),
            "nirs_left_cerebral" => {
                record.nirs_left_cerebral = select_value(events, mapping, context);
            }
            "nirs_right_cerebral" => {
                record.nirs_right_cerebral = select_value(events, mapping, context);
            }
            "fio2" => record.fio2 = select_value(events, mapping, context),
            "o2_flow" => record.o2_flow = select_value(events, mapping, context),
            "peep" => record.peep = select_value(events, mapping, context),
            "pip" => record.pip = select_value(events, mapping, context),
            "vent_rate" => record.vent_rate = select_value(events, mapping, context),
            "vent_mode" => {
                record.vent_mode = select_text(events, mapping)
                    .as_deref()
                    .and_then(normalize_vent_mode);
            }
            "rass" => {
                record.rass = select_value(events, mapping, context).map(|score| score as i32);
            }
            "gcs" => record.gcs = select_value(events, mapping, context),
            other => unreachable!("unmapped hemodynamics target {other}"),
        }
    }

    let normalizer = DoseNormalizer::new();
    for substance in Substance::ALL {
        let dose = normalizer.infusion_dose(&medication, substance, context, table);
        match substance {
            Substance::Norepinephrine => record.norepinephrine = dose,
            Substance::Epinephrine => record.epinephrine = dose,
            Substance::Dobutamine => record.dobutamine = dose,
            Substance::Milrinone => record.milrinone = dose,
            Substance::Vasopressin => record.vasopressin = dose,
        }
    }

    record.vasoactive_spec = checkbox_matches(&medication, &VASOACTIVE_SPEC, &normalizer);
    record.antiplatelets = checkbox_matches(&medication, &ANTIPLATELETS, &normalizer);
    record.antibiotics = checkbox_matches(&medication, &ANTIBIOTICS, &normalizer);

    for (choice, pattern) in ANTICOAGULANTS.iter() {
        if medication.iter().any(|event| pattern.is_match(&event.parameter)) {
            record.anticoagulant = Some(*choice);
        }
    }

    let enteral = case_insensitive(ENTERAL_CATEGORY_PATTERN);
    record.enteral_nutrition = medication
        .iter()
        .any(|event| enteral.is_match(&event.category));

    for (target, category_pattern, parameter_pattern) in TRANSFUSION_PATTERNS {
        let count = transfusion_count(&medication, category_pattern, parameter_pattern);
        match *target {
            "platelet_units" => record.platelet_units = count,
            "red_cell_units" => record.red_cell_units = count,
            "plasma_units" => record.plasma_units = count,
            other => unreachable!("unmapped transfusion target {other}"),
        }
    }

    record.apply_derived_fields();
    record
}

/// Checkbox ids whose drug pattern matched any non-bolus administration.
fn checkbox_matches<Id: Copy + Ord>(
    medication: &[&Event],
    options: &[(Id, Regex)],
    normalizer: &DoseNormalizer,
) -> std::collections::BTreeSet<Id> {
    options
        .iter()
        .filter(|(_, pattern)| {
            medication.iter().any(|event| {
                pattern.is_match(&event.parameter) && !normalizer.is_bolus(&event.parameter)
            })
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Administrations of one blood product over the day, as a count.
fn transfusion_count(
    medication: &[&Event],
    category_pattern: &str,
    parameter_pattern: &str,
) -> Option<u32> {
    let category = case_insensitive(category_pattern);
    let parameter = case_insensitive(parameter_pattern);
    let count = medication
        .iter()
        .filter(|event| {
            category.is_match(&event.category) && parameter.is_match(&event.parameter)
        })
        .count();
    (count > 0).then_some(count as u32)
}
