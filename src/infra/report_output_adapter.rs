use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::ports::ReportOutputPort;
use crate::pipeline::output::RunReport;

/// Writes the JSON run report to a fixed path
pub struct JsonReportOutputAdapter {
    path: PathBuf,
}

impl JsonReportOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportOutputPort for JsonReportOutputAdapter {
    fn write_report(&self, report: &RunReport) -> Result<String> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create report {}", self.path.display()))?;
        report.write_json(BufWriter::new(file))?;
        Ok(self.path.display().to_string())
    }
}
