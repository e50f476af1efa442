//! Tabular time-series parser for vitals, labs and respiratory data.
//!
//! Layout: one row of timestamps, then parameter rows whose cells align
//! positionally with the timestamp row. A block may restart with a fresh
//! timestamp row at any point.

use pdms_model::{Event, Value};

use crate::blocks::{Section, SectionBlocks};
use crate::delimiter::Delimiter;
use crate::timestamp::{is_timestamp_row, parse_timestamp};

/// Per-call parsing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// Do not emit the parameter-name column itself as a value. Lab rows
    /// restate the row label in their first column.
    pub skip_first: bool,
    /// Strip lab flag annotations (`(+)`/`(-)`) before numeric conversion.
    pub clean_lab: bool,
}

/// Prefix stripped from lab sub-panel tokens to form the event category.
const LAB_TOKEN_PREFIX: &str = "Labor:";

/// Parse every block of a section laid out as timestamp-row tables.
pub fn parse_section(
    blocks: &SectionBlocks,
    section: Section,
    source_type: &str,
    delimiter: Delimiter,
    options: TableOptions,
) -> Vec<Event> {
    let mut events = Vec::new();
    for (token, text) in blocks.blocks(section) {
        parse_block(token, text, source_type, delimiter, options, &mut events);
    }
    events
}

fn parse_block(
    token: &str,
    text: &str,
    source_type: &str,
    delimiter: Delimiter,
    options: TableOptions,
    events: &mut Vec<Event>,
) {
    let category = token
        .strip_prefix(LAB_TOKEN_PREFIX)
        .unwrap_or(token)
        .trim()
        .to_string();
    let mut timestamps: Option<Vec<String>> = None;

    for line in text.lines() {
        let cells: Vec<&str> = line.trim_end_matches('\r').split(delimiter.as_char()).collect();

        if is_timestamp_row(&cells) {
            timestamps = Some(cells.iter().map(|cell| cell.trim().to_string()).collect());
            continue;
        }
        let Some(timestamps) = &timestamps else {
            continue;
        };
        let Some((name_index, parameter)) = first_non_empty(&cells) else {
            continue;
        };

        for (index, cell) in cells.iter().enumerate() {
            if cell.trim().is_empty() || (options.skip_first && index == name_index) {
                continue;
            }
            let Some(timestamp) = timestamps.get(index).and_then(|raw| parse_timestamp(raw))
            else {
                continue;
            };
            let mut cleaned = cell.trim().to_string();
            if options.clean_lab {
                cleaned = cleaned.replace("(-)", "").replace("(+)", "");
            }
            events.push(Event {
                timestamp,
                category: category.clone(),
                parameter: parameter.to_string(),
                value: Value::parse_cell(&cleaned),
                source_type: source_type.to_string(),
                source_header: None,
            });
        }
    }
}

fn first_non_empty<'a>(cells: &[&'a str]) -> Option<(usize, &'a str)> {
    cells
        .iter()
        .enumerate()
        .find(|(_, cell)| !cell.trim().is_empty())
        .map(|(index, cell)| (index, cell.trim()))
}
