//! Instrument record builders.
//!
//! One deterministic builder per registry instrument. Each is a pure
//! function of `(event table, day or anchor, key, context)`: it pulls the
//! day's events per source, selects values through the mapping tables,
//! runs the substance conversions, and finishes with the record's derived
//! field pass.

mod hemodynamics;
mod impella;
mod lab;
mod pre_assessment;
mod pump;

pub use hemodynamics::build_hemodynamics_record;
pub use impella::build_impella_record;
pub use lab::build_lab_record;
pub use pre_assessment::build_pre_assessment_record;
pub use pump::build_pump_record;

use chrono::NaiveDate;
use pdms_model::EventTable;

use crate::engine::day_events;

/// Both support devices documented on the same day.
pub(crate) fn dual_support(table: &EventTable, day: NaiveDate) -> bool {
    !day_events(table, day, "ecmo").is_empty() && !day_events(table, day, "impella").is_empty()
}
