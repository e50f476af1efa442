//! Daily Impella assessment record (Impella arm only).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordKey;

/// One day of aggregated Impella parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpellaRecord {
    pub key: RecordKey,
    pub assess_date: NaiveDate,

    /// Pump output, l/min.
    pub flow: Option<f64>,
    /// Purge flow, ml/h.
    pub purge_flow: Option<f64>,
    /// Purge pressure, mmHg.
    pub purge_pressure: Option<f64>,
    /// Performance level parsed from the flow-regulation text (`"P8"` → 8).
    pub p_level: Option<u8>,
}

impl ImpellaRecord {
    pub fn new(key: RecordKey, assess_date: NaiveDate) -> Self {
        Self {
            key,
            assess_date,
            flow: None,
            purge_flow: None,
            purge_pressure: None,
            p_level: None,
        }
    }
}
