//! Value-selection engine.
//!
//! Given the events of one day and one source, a [`CompiledMapping`]
//! selects the matching rows and an [`AggregationStrategy`] collapses their
//! numeric values into a single representative. Unmatched combinations
//! yield `None` — absence is never encoded as zero.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use pdms_model::{AggregationContext, AggregationStrategy, Event, EventTable, FieldMapping};
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Wildcard category pattern: skip the category filter entirely.
const MATCH_ANY: &str = ".*";

/// A field mapping with its patterns compiled for case-insensitive search.
#[derive(Debug)]
pub struct CompiledMapping {
    pub target: &'static str,
    pub source: &'static str,
    category: Option<Regex>,
    parameter: Regex,
}

impl CompiledMapping {
    fn compile(mapping: &FieldMapping) -> Self {
        let category = (mapping.category != MATCH_ANY)
            .then(|| case_insensitive(mapping.category));
        Self {
            target: mapping.target,
            source: mapping.source,
            category,
            parameter: case_insensitive(mapping.parameter),
        }
    }

    /// Does this mapping select the given event?
    pub fn matches(&self, event: &Event) -> bool {
        if !self.parameter.is_match(&event.parameter) {
            return false;
        }
        match &self.category {
            Some(category) => category.is_match(&event.category),
            None => true,
        }
    }
}

/// An immutable set of compiled mappings, built once at startup from a
/// static declaration table.
#[derive(Debug)]
pub struct MappingTable {
    entries: Vec<CompiledMapping>,
}

impl MappingTable {
    pub fn new(mappings: &[FieldMapping]) -> Self {
        Self {
            entries: mappings.iter().map(CompiledMapping::compile).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledMapping> {
        self.entries.iter()
    }

    pub fn get(&self, target: &str) -> Option<&CompiledMapping> {
        self.entries.iter().find(|entry| entry.target == target)
    }
}

/// Compile a declaration pattern for case-insensitive matching. Mapping
/// patterns are static and reviewed, so a failure to compile is a
/// programming error surfaced at startup.
pub(crate) fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|error| panic!("invalid mapping pattern {pattern:?}: {error}"))
}

/// Events of one calendar day whose source tag contains `source`.
pub fn day_events<'a>(table: &'a EventTable, day: NaiveDate, source: &str) -> Vec<&'a Event> {
    let needle = source.to_lowercase();
    table
        .on_day(day)
        .filter(|event| event.source_type.to_lowercase().contains(&needle))
        .collect()
}

/// Rows of `events` selected by the mapping, in input (chronological) order.
pub fn matched_events<'a>(events: &[&'a Event], mapping: &CompiledMapping) -> Vec<&'a Event> {
    events
        .iter()
        .copied()
        .filter(|event| mapping.matches(event))
        .collect()
}

/// Collapse the numeric values selected by `mapping` into one value.
pub fn select_value(
    events: &[&Event],
    mapping: &CompiledMapping,
    context: &AggregationContext,
) -> Option<f64> {
    let matched: Vec<(NaiveDateTime, f64)> = matched_events(events, mapping)
        .into_iter()
        .filter_map(|event| event.value.as_number().map(|value| (event.timestamp, value)))
        .collect();
    aggregate(&matched, context, mapping.target)
}

/// First non-empty textual value selected by `mapping` (ventilation modes,
/// device settings and other string-typed fields).
pub fn select_text(events: &[&Event], mapping: &CompiledMapping) -> Option<String> {
    matched_events(events, mapping)
        .into_iter()
        .find_map(|event| {
            let text = event.value.to_string();
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
}

/// All numeric values of one mapping over the day with their clock times,
/// for review surfaces that show every candidate next to the pick.
pub fn day_values(events: &[&Event], mapping: &CompiledMapping) -> Vec<(f64, NaiveTime)> {
    matched_events(events, mapping)
        .into_iter()
        .filter_map(|event| {
            event
                .value
                .as_number()
                .map(|value| (value, event.timestamp.time()))
        })
        .collect()
}

fn aggregate(
    values: &[(NaiveDateTime, f64)],
    context: &AggregationContext,
    field: &str,
) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match context.strategy {
        AggregationStrategy::Median => Some(median(values.iter().map(|(_, value)| *value))),
        AggregationStrategy::Mean => {
            let sum: f64 = values.iter().map(|(_, value)| value).sum();
            Some(sum / values.len() as f64)
        }
        AggregationStrategy::First => values
            .iter()
            .min_by_key(|(timestamp, _)| *timestamp)
            .map(|(_, value)| *value),
        AggregationStrategy::Last => values
            .iter()
            .max_by_key(|(timestamp, _)| *timestamp)
            .map(|(_, value)| *value),
        AggregationStrategy::Nearest => {
            let Some(reference) = context.reference_time else {
                warn!(field, "nearest strategy without a reference time; no value selected");
                return None;
            };
            nearest(values, reference)
        }
    }
}

/// Median with the usual even-count mean of the middle pair.
pub(crate) fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle]
    } else {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    }
}

/// Value whose seconds-of-day distance to the reference is minimal; ties go
/// to the earliest occurrence.
fn nearest(values: &[(NaiveDateTime, f64)], reference: NaiveTime) -> Option<f64> {
    let reference_seconds = i64::from(reference.num_seconds_from_midnight());
    values
        .iter()
        .min_by_key(|(timestamp, _)| {
            let seconds = i64::from(timestamp.time().num_seconds_from_midnight());
            ((seconds - reference_seconds).abs(), *timestamp)
        })
        .map(|(_, value)| *value)
}
