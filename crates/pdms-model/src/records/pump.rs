//! Daily ECMO pump record (ECLS arm only).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordKey;

/// One day of aggregated ECMO pump settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpRecord {
    pub key: RecordKey,
    pub assess_date: NaiveDate,

    /// Pump speed, rpm.
    pub rpm: Option<f64>,
    /// Arterial blood flow, l/min.
    pub blood_flow: Option<f64>,
    /// Sweep gas flow, l/min.
    pub gas_flow: Option<f64>,
    /// Oxygenator FiO2, %.
    pub fio2: Option<f64>,
}

impl PumpRecord {
    pub fn new(key: RecordKey, assess_date: NaiveDate) -> Self {
        Self {
            key,
            assess_date,
            rpm: None,
            blood_flow: None,
            gas_flow: None,
            fio2: None,
        }
    }
}
