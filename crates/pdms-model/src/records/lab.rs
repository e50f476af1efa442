//! Daily laboratory record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RecordKey, round_to};

/// One day of aggregated laboratory values.
///
/// All analyte fields are `Option`: absence means "not measured that day",
/// never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabRecord {
    pub key: RecordKey,
    pub assess_date: NaiveDate,
    /// Both support devices ran on this day.
    pub dual_support: bool,

    // Arterial blood gas
    pub pco2: Option<f64>,
    pub po2: Option<f64>,
    pub ph: Option<f64>,
    pub hco3: Option<f64>,
    pub base_excess: Option<f64>,
    pub sao2: Option<f64>,
    pub potassium: Option<f64>,
    pub sodium: Option<f64>,
    pub glucose: Option<f64>,
    pub lactate: Option<f64>,
    // Venous blood gas
    pub svo2: Option<f64>,

    // Hematology
    pub wbc: Option<f64>,
    pub hb: Option<f64>,
    pub hct: Option<f64>,
    pub platelets: Option<f64>,
    pub free_hb: Option<f64>,

    // Coagulation
    pub ptt: Option<f64>,
    pub quick: Option<f64>,
    pub inr: Option<f64>,
    pub act: Option<f64>,

    // Enzymes
    pub ck: Option<f64>,
    pub ck_mb: Option<f64>,
    pub ggt: Option<f64>,
    pub ldh: Option<f64>,
    pub lipase: Option<f64>,
    pub got: Option<f64>,
    pub gpt: Option<f64>,

    // Clinical chemistry
    pub pct: Option<f64>,
    pub crp: Option<f64>,
    pub bilirubin: Option<f64>,
    pub creatinine: Option<f64>,
    pub creatinine_clearance: Option<f64>,
    pub urea: Option<f64>,
    pub albumin: Option<f64>,
    pub haptoglobin: Option<f64>,

    // Derived
    pub crp_measured: bool,
    pub pct_measured: bool,
    pub act_measured: bool,
    /// CRP rescaled from the source unit (mg/l) to the registry unit
    /// (mg/dl). Kept separate from the primary `crp` so re-derivation
    /// never divides twice.
    pub crp_mg_dl: Option<f64>,
}

impl LabRecord {
    pub fn new(key: RecordKey, assess_date: NaiveDate) -> Self {
        Self {
            key,
            assess_date,
            dual_support: false,
            pco2: None,
            po2: None,
            ph: None,
            hco3: None,
            base_excess: None,
            sao2: None,
            potassium: None,
            sodium: None,
            glucose: None,
            lactate: None,
            svo2: None,
            wbc: None,
            hb: None,
            hct: None,
            platelets: None,
            free_hb: None,
            ptt: None,
            quick: None,
            inr: None,
            act: None,
            ck: None,
            ck_mb: None,
            ggt: None,
            ldh: None,
            lipase: None,
            got: None,
            gpt: None,
            pct: None,
            crp: None,
            bilirubin: None,
            creatinine: None,
            creatinine_clearance: None,
            urea: None,
            albumin: None,
            haptoglobin: None,
            crp_measured: false,
            pct_measured: false,
            act_measured: false,
            crp_mg_dl: None,
        }
    }

    /// Recompute measured flags and unit rescaling from the primary fields.
    pub fn apply_derived_fields(&mut self) {
        self.crp_measured = self.crp.is_some();
        self.pct_measured = self.pct.is_some();
        self.act_measured = self.act.is_some();
        self.crp_mg_dl = self.crp.map(|crp| round_to(crp / 10.0, 2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Arm;

    fn record() -> LabRecord {
        LabRecord::new(
            RecordKey::new("r-001", Arm::Ecls, 1),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        )
    }

    #[test]
    fn derives_measured_flags_and_rescaled_crp() {
        let mut lab = record();
        lab.crp = Some(123.0);
        lab.apply_derived_fields();
        assert!(lab.crp_measured);
        assert!(!lab.pct_measured);
        assert_eq!(lab.crp_mg_dl, Some(12.3));
        // The primary field stays in source units.
        assert_eq!(lab.crp, Some(123.0));
    }

    #[test]
    fn derivation_is_idempotent() {
        let mut lab = record();
        lab.crp = Some(80.0);
        lab.act = Some(180.0);
        lab.apply_derived_fields();
        let first = lab.clone();
        lab.apply_derived_fields();
        assert_eq!(lab, first);
    }
}
