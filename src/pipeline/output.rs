use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::ALERT_COLUMNS;
use crate::error::Result;
use crate::pipeline::pipeline::{PipelineResult, RunDiagnostics};
use crate::types::{Alert, Period, Season};

/// Write ranked alerts as CSV. An empty slice still produces the header row.
pub fn write_alerts_csv<W: Write>(alerts: &[Alert], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if alerts.is_empty() {
        csv_writer.write_record(ALERT_COLUMNS)?;
    }
    for alert in alerts {
        csv_writer.serialize(alert)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Hex SHA-256 of the upload bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Machine-readable record of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub province: String,
    pub upload_sha256: String,
    pub period: Period,
    pub season: Season,
    pub total_alerts: usize,
    pub priority_alerts: usize,
    pub filtered_alerts: usize,
    pub alert_file: Option<String>,
    pub diagnostics: RunDiagnostics,
}

impl RunReport {
    pub fn new(province: &str, upload_bytes: &[u8], result: &PipelineResult) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            province: province.to_string(),
            upload_sha256: sha256_hex(upload_bytes),
            period: result.period,
            season: result.season,
            total_alerts: result.selection.total(),
            priority_alerts: result.selection.priority_count,
            filtered_alerts: result.selection.non_priority_count,
            alert_file: None,
            diagnostics: result.diagnostics.clone(),
        }
    }

    pub fn with_alert_file(mut self, location: impl Into<String>) -> Self {
        self.alert_file = Some(location.into());
        self
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
