//! Medication dose normalization.
//!
//! Pumps are documented in volume terms (ml/h) while the registry expects
//! weight-normalized doses (µg/kg/min). The conversion needs the drug
//! concentration — parsed from the preparation label, with a per-substance
//! default table as fallback — and the patient weight. When the weight
//! cannot be resolved the conversion fails closed: no dose, never a guess.

use pdms_model::{AggregationContext, Event, EventTable};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::engine::{case_insensitive, median};
use crate::weight::resolve_patient_weight;

/// Continuously infused substances the registry records a dose for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substance {
    Norepinephrine,
    Epinephrine,
    Dobutamine,
    Milrinone,
    Vasopressin,
}

impl Substance {
    pub const ALL: [Self; 5] = [
        Self::Norepinephrine,
        Self::Epinephrine,
        Self::Dobutamine,
        Self::Milrinone,
        Self::Vasopressin,
    ];

    /// Drug-name pattern covering generic and trade spellings. `\b` keeps
    /// `Epinephrin` from matching inside `Norepinephrin`.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Norepinephrine => r"\bNorepinephrin|\bArterenol",
            Self::Epinephrine => r"\bEpinephrin|\bSuprarenin",
            Self::Dobutamine => r"Dobutamin",
            Self::Milrinone => r"Milrinon|Corotrop",
            Self::Vasopressin => r"Vasopressin|Empressin",
        }
    }

    /// Default concentration in µg/ml for preparations whose label does not
    /// encode one (standard dilutions of this ICU).
    pub fn default_concentration_ug_ml(self) -> Option<f64> {
        match self {
            Self::Norepinephrine => Some(100.0),  // 5 mg / 50 ml
            Self::Epinephrine => Some(200.0),     // 10 mg / 50 ml
            Self::Dobutamine => Some(5_000.0),    // 250 mg / 50 ml
            Self::Milrinone => Some(200.0),       // 10 mg / 50 ml
            Self::Vasopressin => None,            // IU-based, see below
        }
    }
}

/// `"5 mg / 50 ml"` — total mass over syringe volume.
static MASS_PER_VOLUME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[,.]\d+)?)\s*mg\s*/\s*(\d+)\s*ml").expect("mass/volume pattern")
});

/// `"5mg/ml"` — concentration given directly.
static MASS_PER_ML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[,.]\d+)?)\s*mg/ml").expect("mg/ml pattern"));

/// Extract the concentration in µg/ml from a preparation label.
///
/// Dobutamine ships as a stock solution whose label concentration does not
/// match the bedside dilution; its standard 250 mg / 50 ml preparation wins
/// over the direct `mg/ml` reading.
pub fn concentration_from_label(label: &str, substance: Substance) -> Option<f64> {
    if let Some(captures) = MASS_PER_VOLUME.captures(label) {
        let mg: f64 = captures[1].replace(',', ".").parse().ok()?;
        let ml: f64 = captures[2].parse().ok()?;
        return Some(mg * 1_000.0 / ml);
    }
    if let Some(captures) = MASS_PER_ML.captures(label) {
        if substance == Substance::Dobutamine {
            return Substance::Dobutamine.default_concentration_ug_ml();
        }
        let mg_per_ml: f64 = captures[1].replace(',', ".").parse().ok()?;
        return Some(mg_per_ml * 1_000.0);
    }
    None
}

/// Converts matched infusion events into registry doses.
///
/// Bolus exclusion is a best-effort heuristic over free-text drug names;
/// the marker list is configurable because the default markers are specific
/// to one source system's naming habits.
#[derive(Debug)]
pub struct DoseNormalizer {
    bolus_markers: Regex,
}

/// Markers tagging pre-filled-syringe (bolus) preparations.
pub const DEFAULT_BOLUS_MARKERS: &[&str] = &[r"\(FER\)", "Fertigspritze"];

impl Default for DoseNormalizer {
    fn default() -> Self {
        Self::with_bolus_markers(DEFAULT_BOLUS_MARKERS)
    }
}

impl DoseNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a normalizer with a custom bolus deny list (regex fragments,
    /// joined as alternatives).
    pub fn with_bolus_markers(markers: &[&str]) -> Self {
        let joined = markers.join("|");
        Self {
            bolus_markers: case_insensitive(&joined),
        }
    }

    /// Is this row a single-dose formulation rather than an infusion?
    pub fn is_bolus(&self, parameter: &str) -> bool {
        self.bolus_markers.is_match(parameter)
    }

    /// Registry dose for one substance over the given medication events.
    ///
    /// µg/kg/min for the catecholamines, rounded to 4 decimals; IU/h for
    /// vasopressin (1 IU/ml standard dilution makes the rate pass through),
    /// rounded to 2 decimals. Returns `None` when no continuous infusion
    /// matched, no concentration could be established, or no plausible
    /// weight is available.
    pub fn infusion_dose(
        &self,
        medication_events: &[&Event],
        substance: Substance,
        context: &AggregationContext,
        table: &EventTable,
    ) -> Option<f64> {
        let name_pattern = case_insensitive(substance.pattern());
        let infusions: Vec<&Event> = medication_events
            .iter()
            .copied()
            .filter(|event| {
                name_pattern.is_match(&event.parameter) && !self.is_bolus(&event.parameter)
            })
            .collect();
        if infusions.is_empty() {
            return None;
        }

        let rates: Vec<f64> = infusions
            .iter()
            .filter_map(|event| event.value.as_number())
            .collect();
        if rates.is_empty() {
            return None;
        }
        let rate_ml_h = median(rates.into_iter());

        // Vasopressin: 40 IU / 40 ml, so ml/h is already IU/h.
        if substance == Substance::Vasopressin {
            return Some(round_to(rate_ml_h, 2));
        }

        let concentration = infusions
            .iter()
            .find_map(|event| concentration_from_label(&event.parameter, substance))
            .or_else(|| substance.default_concentration_ug_ml())?;

        let weight_kg = match context.weight_kg.or_else(|| resolve_patient_weight(table)) {
            Some(weight) => weight,
            None => {
                warn!(
                    substance = ?substance,
                    "no resolvable patient weight; dose not computed"
                );
                return None;
            }
        };

        let ug_kg_min = (rate_ml_h * concentration) / (60.0 * weight_kg);
        Some(round_to(ug_kg_min, 4))
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
