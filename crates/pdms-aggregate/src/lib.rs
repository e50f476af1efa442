//! Day-windowed aggregation of normalized events into registry records.
//!
//! The engine is deliberately dumb about where events came from: it sees
//! the [`pdms_model::EventTable`] contract and nothing else. Field
//! selection is driven by the static mapping tables in [`registry`], value
//! collapse by the strategies in [`engine`], and unit conversion of
//! infusion rates by [`dose`]. The [`instruments`] module wires those
//! pieces into one builder per registry instrument.

pub mod dose;
pub mod engine;
pub mod instruments;
pub mod registry;
pub mod weight;

pub use dose::{DoseNormalizer, Substance};
pub use engine::{CompiledMapping, MappingTable, day_events, select_value};
pub use weight::resolve_patient_weight;
