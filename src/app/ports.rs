use anyhow::Result;

use crate::pipeline::ingestion::ThresholdTable;
use crate::pipeline::output::RunReport;
use crate::types::{Alert, Period};

/// Source of the raw upload bytes for one run
pub trait UploadSourcePort {
    fn read_upload(&self) -> Result<Vec<u8>>;
    /// Human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Source of the seasonal threshold table for a province
pub trait ThresholdSourcePort {
    fn load_thresholds(&self, province: &str) -> Result<ThresholdTable>;
}

/// Destination for the ranked alert table. Returns where it was written.
pub trait AlertOutputPort {
    fn write_alerts(&self, province: &str, period: Period, alerts: &[Alert]) -> Result<String>;
}

/// Destination for the JSON run report. Returns where it was written.
pub trait ReportOutputPort {
    fn write_report(&self, report: &RunReport) -> Result<String>;
}
