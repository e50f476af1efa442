//! Builder tests over a hand-built event table, plus one run over the
//! full parse pipeline.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pdms_aggregate::instruments::{
    build_hemodynamics_record, build_impella_record, build_lab_record,
    build_pre_assessment_record, build_pump_record,
};
use pdms_model::{
    AggregationContext, AggregationStrategy, Anticoagulant, Arm, Event, EventTable, RecordKey,
    Value, VentMode,
};

const DAY: u32 = 10;

fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, DAY).unwrap()
}

fn event(
    timestamp: NaiveDateTime,
    category: &str,
    parameter: &str,
    value: Value,
    source_type: &str,
) -> Event {
    Event {
        timestamp,
        category: category.to_string(),
        parameter: parameter.to_string(),
        value,
        source_type: source_type.to_string(),
        source_header: None,
    }
}

fn sample_table() -> EventTable {
    EventTable::new(vec![
        // Demographics
        event(
            at(DAY, 6, 0),
            "Patientenstamm",
            "Gewicht",
            Value::Number(80.0),
            "PatientInfo",
        ),
        // Vitals
        event(
            at(DAY, 8, 0),
            "Online erfasste Vitaldaten",
            "HF [1/min]",
            Value::Number(82.0),
            "Vitals",
        ),
        event(
            at(DAY, 12, 0),
            "Online erfasste Vitaldaten",
            "HF [1/min]",
            Value::Number(96.0),
            "Vitals",
        ),
        event(
            at(DAY, 8, 0),
            "Online erfasste Vitaldaten",
            "PAPm [mmHg]",
            Value::Number(31.0),
            "Vitals",
        ),
        // Labs
        event(
            at(DAY, 9, 0),
            "Blutgase arteriell",
            "LACTAT [mmol/l]",
            Value::Number(3.1),
            "Lab",
        ),
        event(
            at(DAY, 15, 0),
            "Blutgase arteriell",
            "LACTAT [mmol/l]",
            Value::Number(2.3),
            "Lab",
        ),
        event(
            at(DAY, 9, 0),
            "Klinische Chemie",
            "CRP [mg/l]",
            Value::Number(240.0),
            "Lab",
        ),
        // Respiratory
        event(
            at(DAY, 8, 0),
            "Beatmung",
            "PEEP [mbar]",
            Value::Number(8.0),
            "Respiratory",
        ),
        event(
            at(DAY, 8, 0),
            "Beatmung",
            "Modus",
            Value::Text("SIMV-PC".to_string()),
            "Respiratory",
        ),
        // Devices
        event(
            at(DAY, 10, 0),
            "ECMO 1",
            "Drehzahl",
            Value::Number(3000.0),
            "ECMO",
        ),
        event(
            at(DAY, 10, 0),
            "ECMO 1",
            "Blutfluss arteriell",
            Value::Number(4.2),
            "ECMO",
        ),
        event(
            at(DAY, 10, 30),
            "Impella CP 1",
            "HZV",
            Value::Number(3.1),
            "Impella CP",
        ),
        event(
            at(DAY, 10, 30),
            "Impella CP 1",
            "Flußregelung",
            Value::Text("P8".to_string()),
            "Impella CP",
        ),
        // Medication
        event(
            at(DAY, 7, 0),
            "Perfusoren",
            "Norepinephrin Perfusor 5 mg / 50 ml",
            Value::Number(9.0),
            "Medication",
        ),
        event(
            at(DAY, 13, 0),
            "Perfusoren",
            "Norepinephrin Perfusor 5 mg / 50 ml",
            Value::Number(12.0),
            "Medication",
        ),
        event(
            at(DAY, 7, 30),
            "Fertigspritzen",
            "Epinephrin 1:100 (FER)",
            Value::Number(10.0),
            "Medication",
        ),
        event(
            at(DAY, 11, 0),
            "Perfusoren",
            "Heparin 25000 IE / 50 ml",
            Value::Number(2.0),
            "Medication",
        ),
        event(
            at(DAY, 12, 0),
            "Sonden",
            "Sondenkost",
            Value::Number(30.0),
            "Medication",
        ),
        event(
            at(DAY, 14, 0),
            "Blutprodukte",
            "Erythrozytenkonzentrat",
            Value::Text("1 Einheit".to_string()),
            "Medication",
        ),
        event(
            at(DAY, 16, 0),
            "Blutprodukte",
            "Erythrozytenkonzentrat",
            Value::Text("1 Einheit".to_string()),
            "Medication",
        ),
    ])
}

fn median_context() -> AggregationContext {
    AggregationContext::new(AggregationStrategy::Median)
}

#[test]
fn lab_record_aggregates_and_derives() {
    let record = build_lab_record(
        &sample_table(),
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &median_context(),
    );
    assert_eq!(record.lactate, Some(2.7));
    assert_eq!(record.crp, Some(240.0));
    assert_eq!(record.crp_mg_dl, Some(24.0));
    assert!(record.crp_measured);
    assert!(!record.pct_measured);
    assert_eq!(record.wbc, None);
    assert!(record.dual_support);
}

#[test]
fn hemodynamics_record_covers_vitals_medication_and_ventilation() {
    let record = build_hemodynamics_record(
        &sample_table(),
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &median_context(),
    );
    assert_eq!(record.heart_rate, Some(89.0));
    assert_eq!(record.mean_pap, Some(31.0));
    assert_eq!(record.peep, Some(8.0));
    assert_eq!(record.vent_mode, Some(VentMode::SimvPc));
    // 10.5 ml/h median × 100 µg/ml / (60 × 80 kg)
    assert_eq!(record.norepinephrine, Some(0.2188));
    // The epinephrine row is a pre-filled syringe and must not count.
    assert_eq!(record.epinephrine, None);
    assert!(record.vasoactive_spec.contains(&13));
    assert!(!record.vasoactive_spec.contains(&4));
    assert_eq!(record.anticoagulant, Some(Anticoagulant::Heparin));
    assert!(record.enteral_nutrition);
    assert_eq!(record.red_cell_units, Some(2));
    assert_eq!(record.platelet_units, None);
    assert!(record.pac_present);
    assert!(record.vasoactive_present);
    assert!(record.ventilated);
    assert!(record.dual_support);
}

#[test]
fn nearest_strategy_threads_through_the_builders() {
    let context = AggregationContext::new(AggregationStrategy::Nearest)
        .with_reference_time(NaiveTime::from_hms_opt(14, 0, 0).unwrap());
    let record = build_lab_record(
        &sample_table(),
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &context,
    );
    // 15:00 is closer to 14:00 than 09:00.
    assert_eq!(record.lactate, Some(2.3));
}

#[test]
fn pump_and_impella_records_read_their_device_sources() {
    let table = sample_table();
    let pump = build_pump_record(
        &table,
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &median_context(),
    );
    assert_eq!(pump.rpm, Some(3000.0));
    assert_eq!(pump.blood_flow, Some(4.2));
    assert_eq!(pump.gas_flow, None);

    let impella = build_impella_record(
        &table,
        day(),
        RecordKey::new("r-001", Arm::Impella, 1),
        &median_context(),
    );
    assert_eq!(impella.flow, Some(3.1));
    assert_eq!(impella.p_level, Some(8));
}

#[test]
fn absent_day_yields_an_empty_record_not_zeros() {
    let record = build_lab_record(
        &sample_table(),
        NaiveDate::from_ymd_opt(2025, 9, 25).unwrap(),
        RecordKey::new("r-001", Arm::Ecls, 9),
        &median_context(),
    );
    assert_eq!(record.lactate, None);
    assert_eq!(record.crp, None);
    assert!(!record.dual_support);
}

#[test]
fn pre_assessment_takes_the_closest_values_before_the_anchor() {
    let anchor = at(DAY, 14, 0);
    let record = build_pre_assessment_record(
        &sample_table(),
        anchor,
        &RecordKey::new("r-001", Arm::Ecls, 0),
        &median_context(),
    );
    // 09:00 draw is within 6 h of the 14:00 anchor; the 15:00 draw is after.
    assert_eq!(record.lactate, Some(3.1));
    assert_eq!(record.assess_time, Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    assert_eq!(record.heart_rate, Some(96.0));
    assert_eq!(record.peep, Some(8.0));
    assert_eq!(record.vent_mode, Some(VentMode::SimvPc));
    assert!(record.vasoactive_spec.contains(&13));
    // Closest norepinephrine row before the anchor runs at 12 ml/h.
    assert_eq!(record.norepinephrine, Some(0.25));
    assert!(record.bga_present);
    assert!(record.hemodynamics_present);
    assert!(!record.lab_window_extended);
}

#[test]
fn pre_assessment_lab_fallback_extends_to_24_hours() {
    let mut events = vec![event(
        at(DAY, 2, 0),
        "Gerinnung",
        "PTT [sec]",
        Value::Number(52.0),
        "Lab",
    )];
    events.push(event(
        at(DAY, 6, 0),
        "Patientenstamm",
        "Gewicht",
        Value::Number(80.0),
        "PatientInfo",
    ));
    let table = EventTable::new(events);
    let anchor = at(DAY, 14, 0);
    let record = build_pre_assessment_record(
        &table,
        anchor,
        &RecordKey::new("r-001", Arm::Impella, 0),
        &median_context(),
    );
    assert_eq!(record.ptt, Some(52.0));
    assert!(record.lab_window_extended);
}

#[test]
fn full_pipeline_feeds_the_builders() {
    let export = "\
Ausdruck: Gesamte Akte;10.09.2025 06:00 - 12.09.2025 06:00;;;;;;;;
Universitätsklinikum Musterstadt;;;;;;;;;
Station ICU-2;;;;;;;;;
Pat.-ID;Fall-ID;Alter;Größe;Gewicht;Körperoberfläche;;;;
12345;67890;58 J;183 cm;80 kg;2,02 m²;;;;
;;;;;;;;;
;;;;;;;;;
;;;;;;;;;
Online erfasste Vitaldaten;;;;;;;;;
;;10.09.25 08:00;10.09.25 12:00;;;;;;
;HF [1/min];82;96;;;;;;
Labor: Blutgase arteriell;;;;;;;;;
;10.09.25 09:00;;;;;;;;
LACTAT [mmol/l];3,1;;;;;;;;
Medikamentengaben;;;;;;;;;
Perfusoren;Konzentration;App.- form;Start/Änderung;Stopp;Rate(mL/h);;;;
Norepinephrin Perfusor 5 mg / 50 ml;5 mg / 50 ml;i.v.;10.09.25 07:00;10.09.25 12:00;9;;;;
";
    let table = pdms_ingest::parse_export(export).expect("parse export");
    let record = build_hemodynamics_record(
        &table,
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &median_context(),
    );
    assert_eq!(record.heart_rate, Some(89.0));
    // Weight comes from the parsed demographics: 9 × 100 / (60 × 80).
    assert_eq!(record.norepinephrine, Some(0.1875));

    let lab = build_lab_record(
        &table,
        day(),
        RecordKey::new("r-001", Arm::Ecls, 1),
        &median_context(),
    );
    assert_eq!(lab.lactate, Some(3.1));
}
