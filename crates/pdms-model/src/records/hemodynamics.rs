//! Daily hemodynamics / ventilation / medication record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::RecordKey;

/// Ventilator mode after normalization of the device's free-text spelling
/// (`"SIMV-PC"`, `"simv pc"` and `"SIMV_PC"` all map to [`VentMode::SimvPc`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentMode {
    SpnCpapPs,
    CpapPs,
    BiLevel,
    BiLevelVg,
    Bipap,
    PcBipap,
    Simv,
    SimvPc,
    SimvVc,
    PcSimv,
    VcSimv,
    AcVc,
    AcPc,
    AcPrvc,
    PcCmv,
    PcPsv,
    PcAc,
    Aprv,
    Ippv,
    VcCmv,
    VcAc,
    VcMmv,
    Asb,
    Niv,
    Sbt,
}

/// Systemic anticoagulation choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anticoagulant {
    Heparin,
    Argatroban,
}

/// One day of aggregated vitals, ventilation and medication.
///
/// Continuous catecholamine doses are weight-normalized (µg/kg/min) except
/// vasopressin, which is recorded in IU/h. Checkbox groups hold the ids of
/// the registry's multiple-choice options that matched a drug name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HemodynamicsRecord {
    pub key: RecordKey,
    pub assess_date: NaiveDate,
    pub dual_support: bool,

    // Vitals
    pub heart_rate: Option<f64>,
    pub sys_bp: Option<f64>,
    pub dia_bp: Option<f64>,
    pub mean_bp: Option<f64>,
    pub cvp: Option<f64>,
    pub spo2: Option<f64>,

    // Pulmonary artery catheter
    pub pcwp: Option<f64>,
    pub sys_pap: Option<f64>,
    pub dia_pap: Option<f64>,
    pub mean_pap: Option<f64>,
    pub cardiac_index: Option<f64>,

    // NIRS
    pub nirs_left_cerebral: Option<f64>,
    pub nirs_right_cerebral: Option<f64>,
    pub nirs_left_femoral: Option<f64>,
    pub nirs_right_femoral: Option<f64>,

    // Ventilation
    pub fio2: Option<f64>,
    pub o2_flow: Option<f64>,
    pub peep: Option<f64>,
    pub pip: Option<f64>,
    pub vent_rate: Option<f64>,
    pub vent_mode: Option<VentMode>,

    // Neurology
    pub gcs: Option<f64>,
    pub rass: Option<i32>,

    // Continuous infusions
    pub norepinephrine: Option<f64>,
    pub epinephrine: Option<f64>,
    pub dobutamine: Option<f64>,
    pub milrinone: Option<f64>,
    /// IU/h, not weight-normalized (1 IU/ml standard dilution).
    pub vasopressin: Option<f64>,

    // Medication groups (registry option ids)
    pub vasoactive_spec: BTreeSet<u8>,
    pub antiplatelets: BTreeSet<u8>,
    pub antibiotics: BTreeSet<u8>,
    pub anticoagulant: Option<Anticoagulant>,
    pub enteral_nutrition: bool,

    // Transfusions (administrations counted over the day)
    pub platelet_units: Option<u32>,
    pub red_cell_units: Option<u32>,
    pub plasma_units: Option<u32>,

    // Derived
    pub pac_present: bool,
    pub nirs_present: bool,
    pub vasoactive_present: bool,
    pub ventilated: bool,
}

impl HemodynamicsRecord {
    pub fn new(key: RecordKey, assess_date: NaiveDate) -> Self {
        Self {
            key,
            assess_date,
            dual_support: false,
            heart_rate: None,
            sys_bp: None,
            dia_bp: None,
            mean_bp: None,
            cvp: None,
            spo2: None,
            pcwp: None,
            sys_pap: None,
            dia_pap: None,
            mean_pap: None,
            cardiac_index: None,
            nirs_left_cerebral: None,
            nirs_right_cerebral: None,
            nirs_left_femoral: None,
            nirs_right_femoral: None,
            fio2: None,
            o2_flow: None,
            peep: None,
            pip: None,
            vent_rate: None,
            vent_mode: None,
            gcs: None,
            rass: None,
            norepinephrine: None,
            epinephrine: None,
            dobutamine: None,
            milrinone: None,
            vasopressin: None,
            vasoactive_spec: BTreeSet::new(),
            antiplatelets: BTreeSet::new(),
            antibiotics: BTreeSet::new(),
            anticoagulant: None,
            enteral_nutrition: false,
            platelet_units: None,
            red_cell_units: None,
            plasma_units: None,
            pac_present: false,
            nirs_present: false,
            vasoactive_present: false,
            ventilated: false,
        }
    }

    /// Recompute the presence flags from the primary fields.
    pub fn apply_derived_fields(&mut self) {
        self.pac_present = [
            self.pcwp,
            self.sys_pap,
            self.dia_pap,
            self.mean_pap,
            self.cardiac_index,
        ]
        .iter()
        .any(Option::is_some);

        self.nirs_present = [
            self.nirs_left_cerebral,
            self.nirs_right_cerebral,
            self.nirs_left_femoral,
            self.nirs_right_femoral,
        ]
        .iter()
        .any(Option::is_some);

        self.vasoactive_present = [
            self.norepinephrine,
            self.epinephrine,
            self.dobutamine,
            self.milrinone,
            self.vasopressin,
        ]
        .iter()
        .any(|dose| dose.is_some_and(|dose| dose > 0.0));

        self.ventilated = [self.fio2, self.peep, self.pip].iter().any(Option::is_some);
    }
}
