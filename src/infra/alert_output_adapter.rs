use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::app::ports::AlertOutputPort;
use crate::constants::alert_file_name;
use crate::pipeline::output::write_alerts_csv;
use crate::types::{Alert, Period};

/// Writes `alerts_<province>_week_<week>.csv` into an output directory
pub struct CsvAlertOutputAdapter {
    output_dir: PathBuf,
}

impl CsvAlertOutputAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl AlertOutputPort for CsvAlertOutputAdapter {
    fn write_alerts(&self, province: &str, period: Period, alerts: &[Alert]) -> Result<String> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory {}", self.output_dir.display()))?;

        let path = self.output_dir.join(alert_file_name(province, period.week));
        debug!("Writing {} alerts to {}", alerts.len(), path.display());

        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_alerts_csv(alerts, BufWriter::new(file))?;
        Ok(path.display().to_string())
    }
}
