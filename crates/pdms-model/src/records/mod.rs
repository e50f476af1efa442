//! Typed instrument records.
//!
//! One record per `(record id, arm, day)` and instrument. Records expose a
//! neutral structure: registry-specific serialization (date formats,
//! decimal commas, checkbox field-name mangling) belongs to a downstream
//! formatting layer.
//!
//! Derived fields live in explicitly named `apply_derived_fields` methods.
//! They are pure functions of the primary fields and must be re-invoked
//! after any primary-field edit; running them twice without edits yields
//! identical records.

mod hemodynamics;
mod impella;
mod lab;
mod pre_assessment;
mod pump;

pub use hemodynamics::{Anticoagulant, HemodynamicsRecord, VentMode};
pub use impella::ImpellaRecord;
pub use lab::LabRecord;
pub use pre_assessment::{PreAssessmentRecord, VentilationCategory};
pub use pump::PumpRecord;

use serde::{Deserialize, Serialize};

/// Treatment pathway gating which instruments apply on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    /// Veno-arterial extracorporeal life support.
    Ecls,
    /// Percutaneous microaxial pump.
    Impella,
}

/// Key identifying one day-scoped instrument record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub record_id: String,
    pub arm: Arm,
    /// Day since device implantation, 1-based.
    pub day_index: u32,
}

impl RecordKey {
    pub fn new(record_id: impl Into<String>, arm: Arm, day_index: u32) -> Self {
        Self {
            record_id: record_id.into(),
            arm,
            day_index,
        }
    }
}

/// Round to a fixed number of decimal places, used by derived-field passes
/// so repeated derivation is bit-stable.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
