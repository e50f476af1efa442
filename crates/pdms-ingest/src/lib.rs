//! Structural parsing of PDMS bedside exports.
//!
//! The export is a delimiter-separated text blob with repeated report
//! mastheads, named sections introduced by literal first-column header
//! tokens, and several incompatible layouts inside those sections. This
//! crate recovers a normalized long-format [`pdms_model::EventTable`] from
//! it:
//!
//! 1. [`delimiter`] decides between `;` and `|` (fail fast when unclear)
//! 2. [`cleaner`] strips mastheads, disclaimers and interval notices
//! 3. [`blocks`] segments the cleaned text into named sections
//! 4. the section parsers ([`table`], [`patient_data`], [`medication`],
//!    [`fluid_balance`], [`patient_info`]) turn one block layout each into
//!    events
//! 5. [`pipeline::parse_export`] runs the whole chain and concatenates

pub mod blocks;
pub mod cleaner;
pub mod delimiter;
pub mod error;
pub mod fluid_balance;
pub mod medication;
pub mod patient_data;
pub mod patient_info;
pub mod pipeline;
pub mod table;
pub mod timestamp;

pub use blocks::{Section, SectionBlocks, split_blocks};
pub use cleaner::clean_report;
pub use delimiter::{Delimiter, detect_delimiter};
pub use error::{IngestError, Result};
pub use pipeline::{parse_export, parse_export_with_delimiter};
pub use table::TableOptions;
