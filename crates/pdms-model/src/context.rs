//! Aggregation strategy and call context.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Rule for collapsing multiple same-day values into one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationStrategy {
    #[default]
    Median,
    Mean,
    /// Value whose time of day is closest to the reference time; requires
    /// [`AggregationContext::reference_time`].
    Nearest,
    First,
    Last,
}

/// Explicit context passed into every aggregation call.
///
/// There is no ambient session state: reference time and patient weight
/// travel with the call, so each aggregation stays a pure function of
/// `(event table, day, context)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationContext {
    pub strategy: AggregationStrategy,
    /// Reference time of day for [`AggregationStrategy::Nearest`].
    pub reference_time: Option<NaiveTime>,
    /// Manually confirmed patient weight in kg. When absent, dose
    /// normalization falls back to the weight recovered from the export.
    pub weight_kg: Option<f64>,
}

impl AggregationContext {
    pub fn new(strategy: AggregationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reference_time(mut self, reference_time: NaiveTime) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    #[must_use]
    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }
}
