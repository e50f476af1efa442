//! Static field-mapping registry.
//!
//! These tables are configuration data, not logic: each row ties one record
//! field to the source events feeding it. Parameter spellings are the ones
//! the source system prints (German, with unit brackets), so the patterns
//! are matched case-insensitively and anchored where the spelling is
//! stable.
//!
//! The upstream system writes both `Norepinephrin` and `Epinephrin` drug
//! labels; `\b` anchors keep `Epinephrin` patterns from matching inside
//! `Norepinephrin` (no lookbehind available, none needed).

use std::sync::LazyLock;

use pdms_model::{Anticoagulant, FieldMapping, VentMode};
use regex::Regex;

use crate::engine::{MappingTable, case_insensitive};

/// Laboratory instrument mappings.
pub static LAB_FIELD_MAPPINGS: &[FieldMapping] = &[
    // Arterial blood gas
    FieldMapping::new("pco2", "Lab", "Blutgase arteriell", r"^PCO2"),
    FieldMapping::new("po2", "Lab", "Blutgase arteriell", r"^PO2"),
    FieldMapping::new("ph", "Lab", "Blutgase arteriell", r"^PH$|^PH "),
    FieldMapping::new("hco3", "Lab", "Blutgase arteriell", r"^HCO3"),
    FieldMapping::new("base_excess", "Lab", "Blutgase arteriell", r"^ABEc"),
    FieldMapping::new("sao2", "Lab", "Blutgase arteriell", r"^O2-SAETTIGUNG"),
    FieldMapping::new("potassium", "Lab", "Blutgase arteriell", r"^KALIUM"),
    FieldMapping::new("sodium", "Lab", "Blutgase arteriell", r"^NATRIUM"),
    FieldMapping::new("glucose", "Lab", "Blutgase arteriell", r"^GLUCOSE"),
    FieldMapping::new("lactate", "Lab", "Blutgase arteriell", r"^LACTAT"),
    // Venous blood gas
    FieldMapping::new("svo2", "Lab", "Blutgase venös", r"^O2-SAETTIGUNG"),
    // Hematology
    FieldMapping::new("wbc", "Lab", "Blutbild", r"^WBC"),
    FieldMapping::new("hb", "Lab", "Blutbild", r"^HB \(HGB\)|^HB\b"),
    FieldMapping::new("hct", "Lab", "Blutbild", r"^HCT"),
    FieldMapping::new("platelets", "Lab", "Blutbild", r"^PLT"),
    FieldMapping::new("free_hb", "Lab", "Blutbild|Klinische Chemie", r"^FREIES HB"),
    // Coagulation
    FieldMapping::new("ptt", "Lab", "Gerinnung", r"^PTT"),
    FieldMapping::new("quick", "Lab", "Gerinnung", r"^TPZ"),
    FieldMapping::new("inr", "Lab", "Gerinnung", r"^INR"),
    // Bedside ACT devices report under their own source tag.
    FieldMapping::new("act", "ACT", ".*", r"^ACT"),
    // Enzymes
    FieldMapping::new("ck", "Lab", "Enzyme", r"^CK \[|^CK$"),
    FieldMapping::new("ck_mb", "Lab", "Enzyme", r"^CK-MB"),
    FieldMapping::new("ggt", "Lab", "Enzyme", r"^GGT"),
    FieldMapping::new("ldh", "Lab", "Enzyme", r"^LDH"),
    FieldMapping::new("lipase", "Lab", "Enzyme", r"^LIPASE"),
    FieldMapping::new("got", "Lab", "Enzyme", r"^GOT"),
    FieldMapping::new("gpt", "Lab", "Enzyme", r"^GPT"),
    // Clinical chemistry
    FieldMapping::new("pct", "Lab", "Klinische Chemie|Proteine", r"^PROCALCITONIN"),
    FieldMapping::new("crp", "Lab", "Klinische Chemie|Proteine", r"^CRP"),
    FieldMapping::new("bilirubin", "Lab", "Klinische Chemie", r"^BILI"),
    FieldMapping::new("creatinine", "Lab", "Klinische Chemie|Retention", r"^KREATININ"),
    FieldMapping::new("urea", "Lab", "Klinische Chemie|Retention", r"^HARNSTOFF"),
    FieldMapping::new(
        "creatinine_clearance",
        "Lab",
        "Klinische Chemie|Retention",
        r"^GFRKREA",
    ),
    FieldMapping::new("albumin", "Lab", "Klinische Chemie|Proteine", r"^ALBUMIN"),
    FieldMapping::new("haptoglobin", "Lab", "Klinische Chemie|Proteine", r"^HAPTOGLOBIN"),
];

/// Hemodynamics / ventilation instrument mappings.
pub static HEMODYNAMICS_FIELD_MAPPINGS: &[FieldMapping] = &[
    // Vitals
    FieldMapping::new("heart_rate", "Vitals", ".*", r"^HF\s*\["),
    FieldMapping::new("sys_bp", "Vitals", ".*", r"^ABPs\s*\[|^ARTs\s*\["),
    FieldMapping::new("dia_bp", "Vitals", ".*", r"^ABPd\s*\[|^ARTd\s*\["),
    FieldMapping::new("mean_bp", "Vitals", ".*", r"^ABPm\s*\[|^ARTm\s*\["),
    FieldMapping::new("cvp", "Vitals", ".*", r"^ZVDm\s*\["),
    FieldMapping::new("spo2", "Vitals", ".*", r"^SpO2\s*\[%\]"),
    // Pulmonary artery catheter values only come from the online feed.
    FieldMapping::new("pcwp", "Vitals", r"^Online.*", r"^PCWP\s*\[|^PAWP\s*\["),
    FieldMapping::new("sys_pap", "Vitals", r"^Online.*", r"^PAPs\s*\["),
    FieldMapping::new("dia_pap", "Vitals", r"^Online.*", r"^PAPd\s*\["),
    FieldMapping::new("mean_pap", "Vitals", r"^Online.*", r"^PAPm\s*\["),
    FieldMapping::new("cardiac_index", "Vitals", r"^Online.*", r"^CCI\s*\[|^HZV"),
    FieldMapping::new("nirs_left_cerebral", "Vitals", ".*", r"NIRS Channel 1 RSO2|NIRS.*Channel.*1"),
    FieldMapping::new("nirs_right_cerebral", "Vitals", ".*", r"NIRS Channel 2 RSO2|NIRS.*Channel.*2"),
    // Ventilation
    FieldMapping::new("fio2", "Respiratory", ".*", r"^FiO2\s*\[%\]"),
    FieldMapping::new("o2_flow", "O2 Gabe", ".*", r"^O2\s*l/min"),
    FieldMapping::new("peep", "Respiratory", ".*", r"^PEEP\s*\["),
    FieldMapping::new("pip", "Respiratory", ".*", r"^Ppeak\s*\[|^insp.*Spitzendruck"),
    FieldMapping::new("vent_rate", "Respiratory", ".*", r"mand.*Atemfrequenz|^mand\. Atemfrequenz"),
    FieldMapping::new("vent_mode", "Respiratory", ".*", r"^Modus"),
    // Scores
    FieldMapping::new("rass", "Richmond", ".*", r"^Summe Richmond-Agitation-Sedation"),
    FieldMapping::new("gcs", "GCS", ".*", r"^Summe GCS2"),
];

/// ECMO pump instrument mappings.
pub static PUMP_FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::new("rpm", "ECMO", ".*", r"^Drehzahl"),
    FieldMapping::new("blood_flow", "ECMO", ".*", r"^Blutfluss arteriell|^Blutfluss.*l/min"),
    FieldMapping::new("gas_flow", "ECMO", ".*", r"^Gasfluss"),
    FieldMapping::new("fio2", "ECMO", ".*", r"^FiO2"),
];

/// Impella assessment mappings.
pub static IMPELLA_FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping::new("flow", "Impella", ".*", r"^HZV"),
    FieldMapping::new("purge_flow", "Impella", ".*", r"Purgefluß|Purgefluss|Purge.*ml/h"),
    FieldMapping::new("purge_pressure", "Impella", ".*", r"Purgedruck"),
];

pub static LAB_FIELDS: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::new(LAB_FIELD_MAPPINGS));
pub static HEMODYNAMICS_FIELDS: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::new(HEMODYNAMICS_FIELD_MAPPINGS));
pub static PUMP_FIELDS: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::new(PUMP_FIELD_MAPPINGS));
pub static IMPELLA_FIELDS: LazyLock<MappingTable> =
    LazyLock::new(|| MappingTable::new(IMPELLA_FIELD_MAPPINGS));

/// Vasoactive checkbox options: registry option id → drug-name pattern.
pub static VASOACTIVE_SPEC_PATTERNS: &[(u8, &str)] = &[
    (1, r"Dobutamin"),
    (2, r"Dopamin"),
    (3, r"Enoximon"),
    (4, r"\bEpinephrin|\bSuprarenin"),
    (5, r"Esmolol"),
    (6, r"Levosimendan|Simdax"),
    (7, r"Metaraminol|Aramino"),
    (8, r"Metoprolol|Beloc"),
    (9, r"Milrinon|Corotrop"),
    (10, r"Nicardipin"),
    (11, r"Nitroglycerin|Nitro"),
    (12, r"Nitroprussid"),
    (13, r"\bNorepinephrin|\bArterenol"),
    (14, r"Phenylephrin"),
    (15, r"Tolazolin"),
    (16, r"Vasopressin|Empressin"),
];

/// Antiplatelet checkbox options.
pub static ANTIPLATELET_PATTERNS: &[(u8, &str)] = &[
    (1, r"Aspirin|ASS|Aspisol"),
    (2, r"Plavix|Clopidogrel"),
    (3, r"Ticagrelor|Brilique"),
    (4, r"Prasugrel|Efient"),
];

/// Antibiotic / antimycotic checkbox options.
pub static ANTIBIOTIC_PATTERNS: &[(u8, &str)] = &[
    (1, r"Cefuroxim|Zinacef|Zinnat"),
    (2, r"Piperacillin|Tazobactam|Pip/Taz|Tazobac"),
    (3, r"Meropenem|Meronem"),
    (4, r"Vancomycin|Vanco"),
    (5, r"Vancomycin.*p\.o\.|Vanco.*p\.o\."),
    (6, r"Linezolid|Zyvoxid"),
    (7, r"Daptomycin|Cubicin"),
    (8, r"Penicillin G|Penicillin"),
    (9, r"Flucloxacillin|Staphylex"),
    (10, r"Rifampicin|Eremfat"),
    (11, r"Gentamicin|Refobacin"),
    (12, r"Tobramycin|Gernebacin"),
    (13, r"Ciprofloxacin|Cipro"),
    (15, r"Erythromycin|Erythrocin"),
    (16, r"Caspofungin|Cancidas"),
    (17, r"Amphotericin B|Ampho-Moronal|Ambisome"),
    (18, r"Metronidazol|Clont|Arilin"),
    (19, r"Cefazolin|Gramaxin"),
    (20, r"Ceftriaxon|Rocephin"),
];

/// Systemic anticoagulants (single choice, later matches win).
pub static ANTICOAGULANT_PATTERNS: &[(Anticoagulant, &str)] = &[
    (Anticoagulant::Heparin, r"Heparin"),
    (Anticoagulant::Argatroban, r"Argatroban|Argatra"),
];

/// Transfusion products counted per day from the medication section.
pub static TRANSFUSION_PATTERNS: &[(&str, &str, &str)] = &[
    ("platelet_units", r"Blutprodukte|Transfusion", r"Thrombozyt|\bTK\b"),
    ("red_cell_units", r"Blutprodukte|Transfusion", r"Erythrozyt|\bEK\b"),
    ("plasma_units", r"Blutprodukte|Transfusion", r"\bFFP\b|Frischplasma|Plasma"),
];

/// Enteral feeding is recognized by the tube-feed drug class.
pub static ENTERAL_CATEGORY_PATTERN: &str = r"\bSonden\b";

pub static VASOACTIVE_SPEC: LazyLock<Vec<(u8, Regex)>> =
    LazyLock::new(|| compile_options(VASOACTIVE_SPEC_PATTERNS));
pub static ANTIPLATELETS: LazyLock<Vec<(u8, Regex)>> =
    LazyLock::new(|| compile_options(ANTIPLATELET_PATTERNS));
pub static ANTIBIOTICS: LazyLock<Vec<(u8, Regex)>> =
    LazyLock::new(|| compile_options(ANTIBIOTIC_PATTERNS));
pub static ANTICOAGULANTS: LazyLock<Vec<(Anticoagulant, Regex)>> = LazyLock::new(|| {
    ANTICOAGULANT_PATTERNS
        .iter()
        .map(|(choice, pattern)| (*choice, case_insensitive(pattern)))
        .collect()
});

fn compile_options(options: &[(u8, &str)]) -> Vec<(u8, Regex)> {
    options
        .iter()
        .map(|(id, pattern)| (*id, case_insensitive(pattern)))
        .collect()
}

/// Ventilator-mode spellings that need explicit normalization before the
/// canonical-name lookup. `STANDBY` maps to nothing on purpose.
static VENT_MODE_ALIASES: &[(&str, Option<VentMode>)] = &[
    ("CPAP", Some(VentMode::SpnCpapPs)),
    ("CPAP_PS", Some(VentMode::CpapPs)),
    ("SPN_CPAP", Some(VentMode::SpnCpapPs)),
    ("SPN_CPAP_PS", Some(VentMode::SpnCpapPs)),
    ("BILEVEL", Some(VentMode::BiLevel)),
    ("BI_LEVEL", Some(VentMode::BiLevel)),
    ("BILEVEL_VG", Some(VentMode::BiLevelVg)),
    ("BIPAP", Some(VentMode::Bipap)),
    ("PC_BIPAP", Some(VentMode::PcBipap)),
    ("SIMV", Some(VentMode::Simv)),
    ("SIMV_PC", Some(VentMode::SimvPc)),
    ("SIMV_VC", Some(VentMode::SimvVc)),
    ("PC_SIMV", Some(VentMode::PcSimv)),
    ("VC_SIMV", Some(VentMode::VcSimv)),
    ("A_C_VC", Some(VentMode::AcVc)),
    ("A_C_PC", Some(VentMode::AcPc)),
    ("A_C_PRVC", Some(VentMode::AcPrvc)),
    ("AC_VC", Some(VentMode::AcVc)),
    ("AC_PC", Some(VentMode::AcPc)),
    ("PC_CMV", Some(VentMode::PcCmv)),
    ("PC_PSV", Some(VentMode::PcPsv)),
    ("PC_AC", Some(VentMode::PcAc)),
    ("PC_PC_APRV", Some(VentMode::Aprv)),
    ("APRV", Some(VentMode::Aprv)),
    ("IPPV", Some(VentMode::Ippv)),
    ("VC_CMV", Some(VentMode::VcCmv)),
    ("VC_AC", Some(VentMode::VcAc)),
    ("VC_MMV", Some(VentMode::VcMmv)),
    ("SPONTANEOUS", Some(VentMode::SpnCpapPs)),
    ("SPONT", Some(VentMode::SpnCpapPs)),
    ("ASB", Some(VentMode::Asb)),
    ("NIV", Some(VentMode::Niv)),
    ("SBT", Some(VentMode::Sbt)),
    ("STANDBY", None),
];

/// Normalize a ventilator-mode string (`"SIMV-PC"`, `"simv pc"`) to the
/// canonical mode, or `None` for unknown and explicitly ignored modes.
pub fn normalize_vent_mode(raw: &str) -> Option<VentMode> {
    let normalized: String = raw
        .trim()
        .to_uppercase()
        .replace(['-', ' '], "_");
    match VENT_MODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
    {
        Some((_, mode)) => *mode,
        None => {
            tracing::warn!(mode = raw, "unknown ventilation mode");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mapping_pattern_compiles() {
        // Force the lazy tables; invalid patterns would panic here.
        assert!(LAB_FIELDS.iter().count() >= 30);
        assert!(HEMODYNAMICS_FIELDS.iter().count() >= 18);
        assert_eq!(PUMP_FIELDS.iter().count(), 4);
        assert_eq!(IMPELLA_FIELDS.iter().count(), 3);
        assert_eq!(VASOACTIVE_SPEC.len(), 16);
        assert!(ANTIBIOTICS.len() >= 19);
    }

    #[test]
    fn epinephrine_pattern_does_not_match_norepinephrine() {
        let epinephrine = &VASOACTIVE_SPEC
            .iter()
            .find(|(id, _)| *id == 4)
            .unwrap()
            .1;
        assert!(epinephrine.is_match("Epinephrin Perfusor 10 mg / 50 ml"));
        assert!(!epinephrine.is_match("Norepinephrin Perfusor 5 mg / 50 ml"));
    }

    #[test]
    fn vent_mode_normalization_handles_spelling_variants() {
        assert_eq!(normalize_vent_mode("SIMV-PC"), Some(VentMode::SimvPc));
        assert_eq!(normalize_vent_mode("simv pc"), Some(VentMode::SimvPc));
        assert_eq!(normalize_vent_mode("CPAP"), Some(VentMode::SpnCpapPs));
        assert_eq!(normalize_vent_mode("STANDBY"), None);
        assert_eq!(normalize_vent_mode("WARP-DRIVE"), None);
    }
}
