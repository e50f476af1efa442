//! Pre-implantation assessment record.
//!
//! Anchored at the device implantation time instead of a calendar day:
//! values are the closest observations before the anchor within a bounded
//! window (6 h, labs falling back to 24 h).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Arm, VentMode};

/// Coarse ventilation category derived from which ventilation fields
/// resolved before implantation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VentilationCategory {
    Invasive,
    NonInvasive,
    HighFlow,
}

/// Snapshot of the patient state immediately before device implantation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreAssessmentRecord {
    pub record_id: String,
    pub arm: Arm,
    /// Implantation time the window is anchored to.
    pub anchor: NaiveDateTime,
    /// Date/time of the latest blood gas draw that contributed values.
    pub assess_date: Option<NaiveDate>,
    pub assess_time: Option<NaiveTime>,

    // Arterial/venous blood gas
    pub pco2: Option<f64>,
    pub po2: Option<f64>,
    pub ph: Option<f64>,
    pub hco3: Option<f64>,
    pub base_excess: Option<f64>,
    pub potassium: Option<f64>,
    pub sodium: Option<f64>,
    pub sao2: Option<f64>,
    pub glucose: Option<f64>,
    pub lactate: Option<f64>,
    pub svo2: Option<f64>,

    // Ventilation
    pub fio2: Option<f64>,
    pub o2_flow: Option<f64>,
    pub peep: Option<f64>,
    pub pip: Option<f64>,
    pub vent_rate: Option<f64>,
    pub vent_mode: Option<VentMode>,

    // Hemodynamics
    pub heart_rate: Option<f64>,
    pub sys_bp: Option<f64>,
    pub dia_bp: Option<f64>,
    pub mean_bp: Option<f64>,
    pub cvp: Option<f64>,
    pub spo2: Option<f64>,
    pub pcwp: Option<f64>,
    pub sys_pap: Option<f64>,
    pub dia_pap: Option<f64>,
    pub mean_pap: Option<f64>,
    pub cardiac_index: Option<f64>,

    // Neurology
    pub gcs: Option<f64>,

    // Labs
    pub wbc: Option<f64>,
    pub hb: Option<f64>,
    pub hct: Option<f64>,
    pub platelets: Option<f64>,
    pub ptt: Option<f64>,
    pub quick: Option<f64>,
    pub inr: Option<f64>,
    pub ck: Option<f64>,
    pub got: Option<f64>,
    pub ldh: Option<f64>,
    pub creatinine: Option<f64>,
    pub urea: Option<f64>,
    pub albumin: Option<f64>,
    pub crp: Option<f64>,
    pub pct: Option<f64>,
    pub act: Option<f64>,
    /// Some lab value only resolved via the extended 24 h window.
    pub lab_window_extended: bool,

    // Medication in the 24 h before implantation
    pub vasoactive_spec: BTreeSet<u8>,
    pub norepinephrine: Option<f64>,
    pub epinephrine: Option<f64>,
    pub dobutamine: Option<f64>,
    pub milrinone: Option<f64>,
    pub vasopressin: Option<f64>,

    // Derived
    pub bga_present: bool,
    pub vent_present: bool,
    pub ventilation_category: Option<VentilationCategory>,
    pub hemodynamics_present: bool,
    pub pac_present: bool,
    pub neuro_present: bool,
    pub lab_present: bool,
}

impl PreAssessmentRecord {
    pub fn new(record_id: impl Into<String>, arm: Arm, anchor: NaiveDateTime) -> Self {
        Self {
            record_id: record_id.into(),
            arm,
            anchor,
            assess_date: None,
            assess_time: None,
            pco2: None,
            po2: None,
            ph: None,
            hco3: None,
            base_excess: None,
            potassium: None,
            sodium: None,
            sao2: None,
            glucose: None,
            lactate: None,
            svo2: None,
            fio2: None,
            o2_flow: None,
            peep: None,
            pip: None,
            vent_rate: None,
            vent_mode: None,
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
            gcs: None,
            wbc: None,
            hb: None,
            hct: None,
            platelets: None,
            ptt: None,
            quick: None,
            inr: None,
            ck: None,
            got: None,
            ldh: None,
            creatinine: None,
            urea: None,
            albumin: None,
            crp: None,
            pct: None,
            act: None,
            lab_window_extended: false,
            vasoactive_spec: BTreeSet::new(),
            norepinephrine: None,
            epinephrine: None,
            dobutamine: None,
            milrinone: None,
            vasopressin: None,
            bga_present: false,
            vent_present: false,
            ventilation_category: None,
            hemodynamics_present: false,
            pac_present: false,
            neuro_present: false,
            lab_present: false,
        }
    }

    /// Recompute the presence flags and the ventilation category.
    pub fn apply_derived_fields(&mut self) {
        self.bga_present = [
            self.pco2,
            self.po2,
            self.ph,
            self.hco3,
            self.base_excess,
            self.potassium,
            self.sodium,
            self.sao2,
            self.glucose,
            self.lactate,
            self.svo2,
        ]
        .iter()
        .any(Option::is_some);

        self.vent_present = self.vent_mode.is_some()
            || [self.fio2, self.o2_flow, self.peep, self.pip, self.vent_rate]
                .iter()
                .any(Option::is_some);

        self.ventilation_category = if !self.vent_present {
            None
        } else if self.vent_rate.is_some() {
            Some(VentilationCategory::Invasive)
        } else if self.peep.is_some() {
            Some(VentilationCategory::NonInvasive)
        } else if self.fio2.is_some() {
            Some(VentilationCategory::HighFlow)
        } else {
            None
        };

        self.pac_present = [
            self.pcwp,
            self.sys_pap,
            self.dia_pap,
            self.mean_pap,
            self.cardiac_index,
        ]
        .iter()
        .any(Option::is_some);

        self.hemodynamics_present = self.pac_present
            || [
                self.heart_rate,
                self.sys_bp,
                self.dia_bp,
                self.mean_bp,
                self.cvp,
                self.spo2,
            ]
            .iter()
            .any(Option::is_some);

        self.neuro_present = self.gcs.is_some();

        self.lab_present = [
            self.wbc,
            self.hb,
            self.hct,
            self.platelets,
            self.ptt,
            self.quick,
            self.inr,
            self.ck,
            self.got,
            self.ldh,
            self.creatinine,
            self.urea,
            self.albumin,
            self.crp,
            self.pct,
            self.act,
        ]
        .iter()
        .any(Option::is_some);
    }
}
