//! The parse pipeline: raw export text in, normalized event table out.

use pdms_model::{Event, EventTable};
use tracing::debug;

use crate::blocks::{Section, split_blocks};
use crate::cleaner::clean_report;
use crate::delimiter::{Delimiter, detect_delimiter};
use crate::error::{IngestError, Result};
use crate::table::TableOptions;
use crate::{delimiter as delimiter_mod, fluid_balance, medication, patient_data, patient_info, table};

/// Parse a full export with automatic delimiter detection.
///
/// # Errors
///
/// [`IngestError::AmbiguousDelimiter`] when neither `;` nor `|` dominates
/// the sample, [`IngestError::NoRecognizedSections`] when the cleaned text
/// contains no known section header.
pub fn parse_export(raw: &str) -> Result<EventTable> {
    match detect_delimiter(raw) {
        Some(delimiter) => parse_export_with_delimiter(raw, delimiter),
        None => {
            let (semicolons, pipes) = delimiter_mod::count_candidates(raw);
            Err(IngestError::AmbiguousDelimiter { semicolons, pipes })
        }
    }
}

/// Parse a full export with a known delimiter.
pub fn parse_export_with_delimiter(raw: &str, delimiter: Delimiter) -> Result<EventTable> {
    let cleaned = clean_report(raw);
    let blocks = split_blocks(&cleaned, delimiter);
    if blocks.is_empty() {
        return Err(IngestError::NoRecognizedSections);
    }

    let mut events: Vec<Event> = Vec::new();

    let mut collect = |label: &str, section_events: Vec<Event>| {
        debug!(section = label, rows = section_events.len(), "parsed section");
        events.extend(section_events);
    };

    collect(
        "vitals",
        table::parse_section(
            &blocks,
            Section::Vitals,
            "Vitals",
            delimiter,
            TableOptions::default(),
        ),
    );
    collect(
        "lab",
        table::parse_section(
            &blocks,
            Section::Lab,
            "Lab",
            delimiter,
            TableOptions {
                skip_first: true,
                clean_lab: true,
            },
        ),
    );
    collect(
        "respiratory",
        table::parse_section(
            &blocks,
            Section::Respiratory,
            "Respiratory",
            delimiter,
            TableOptions::default(),
        ),
    );
    if let Some(text) = blocks.single(Section::AllPatientData) {
        collect(
            "all patient data",
            patient_data::parse_patient_data(text, delimiter),
        );
    }
    if let Some(text) = blocks.single(Section::FluidBalance) {
        collect(
            "fluid balance",
            fluid_balance::parse_fluid_balance(text, delimiter),
        );
    }
    if let Some(text) = blocks.single(Section::Medication) {
        collect("medication", medication::parse_medication(text, delimiter));
    }
    collect(
        "patient info",
        patient_info::parse_patient_info(raw, delimiter),
    );

    debug!(rows = events.len(), "normalized event table");
    Ok(EventTable::new(events))
}
