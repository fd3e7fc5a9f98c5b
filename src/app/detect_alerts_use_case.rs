use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::app::ports::{AlertOutputPort, ReportOutputPort, ThresholdSourcePort, UploadSourcePort};
use crate::error::AlertError;
use crate::observability::metrics;
use crate::pipeline::ingestion::RawTable;
use crate::pipeline::output::RunReport;
use crate::pipeline::{AlertPipeline, PipelineResult, RunDiagnostics};
use crate::types::AlertLevel;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    pub province: String,
    pub result: PipelineResult,
    pub alert_location: String,
    pub report: RunReport,
    pub report_location: Option<String>,
}

impl DetectionOutcome {
    /// "Total alerts for <province>: N (P priority + F filtered)"
    pub fn summary_line(&self) -> String {
        let selection = &self.result.selection;
        format!(
            "Total alerts for {}: {} ({} priority + {} filtered)",
            self.province,
            selection.total(),
            selection.priority_count,
            selection.non_priority_count
        )
    }
}

/// Use case for one alert run: read the upload, load thresholds, run the
/// pipeline, and hand the ranked alerts to the output ports
pub struct DetectAlertsUseCase {
    pipeline: AlertPipeline,
    thresholds: Box<dyn ThresholdSourcePort>,
    alert_output: Box<dyn AlertOutputPort>,
    report_output: Option<Box<dyn ReportOutputPort>>,
}

impl DetectAlertsUseCase {
    pub fn new(
        pipeline: AlertPipeline,
        thresholds: Box<dyn ThresholdSourcePort>,
        alert_output: Box<dyn AlertOutputPort>,
    ) -> Self {
        Self {
            pipeline,
            thresholds,
            alert_output,
            report_output: None,
        }
    }

    pub fn with_report_output(mut self, report_output: Box<dyn ReportOutputPort>) -> Self {
        self.report_output = Some(report_output);
        self
    }

    /// Run detection for a province, recording run metrics either way
    pub fn execute(&self, province: &str, upload: &dyn UploadSourcePort) -> Result<DetectionOutcome> {
        metrics::run::started();
        let started = Instant::now();

        let outcome = self.detect(province, upload);

        metrics::run::duration(started.elapsed().as_secs_f64());
        if let Err(e) = &outcome {
            let kind = failure_kind(e);
            metrics::run::failed(kind);
            error!(province = %province, kind = kind, "Alert run failed: {:#}", e);
        }
        outcome
    }

    fn detect(&self, province: &str, upload: &dyn UploadSourcePort) -> Result<DetectionOutcome> {
        info!("Reading upload from {}", upload.describe());
        let bytes = upload.read_upload()?;
        let raw = RawTable::from_csv_reader(bytes.as_slice())
            .with_context(|| format!("Failed to read upload {} as CSV", upload.describe()))?;

        let thresholds = self.thresholds.load_thresholds(province)?;
        info!("Loaded {} threshold rows for {}", thresholds.len(), province);

        let result = self.pipeline.run(raw, &thresholds)?;
        log_diagnostics(&result.diagnostics);
        record_metrics(&result);

        if result.selection.total() == 0 {
            warn!("No alerts generated for {} in week {}", province, result.period.week);
        }

        let alert_location = self
            .alert_output
            .write_alerts(province, result.period, &result.selection.ranked)?;
        info!("Alerts written to {}", alert_location);

        let report = RunReport::new(province, &bytes, &result).with_alert_file(alert_location.clone());
        let report_location = match &self.report_output {
            Some(output) => {
                let location = output.write_report(&report)?;
                info!("Run report written to {}", location);
                Some(location)
            }
            None => None,
        };

        let outcome = DetectionOutcome {
            province: province.to_string(),
            result,
            alert_location,
            report,
            report_location,
        };
        info!("{}", outcome.summary_line());
        Ok(outcome)
    }
}

/// Error kind label for the failure counter
fn failure_kind(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AlertError>())
        .map(AlertError::kind)
        .unwrap_or("other")
}

fn log_diagnostics(diagnostics: &RunDiagnostics) {
    for (i, attempt) in diagnostics.period.attempts.iter().enumerate() {
        debug!(
            "Pattern {} ({}) success: {}/{}",
            i + 1,
            attempt.pattern,
            attempt.matched,
            attempt.total
        );
    }
    info!(
        pattern = %diagnostics.period.selected_pattern,
        dropped_rows = diagnostics.period.dropped_rows,
        "Parsed week {} of {} ({})",
        diagnostics.reporting_week,
        diagnostics.reporting_year,
        diagnostics.season
    );
    info!(
        "Found {} facilities, {} disease columns, {} long rows",
        diagnostics.facility_count, diagnostics.disease_columns, diagnostics.long_rows
    );
    info!("Applied year-round season to {} diseases", diagnostics.year_round_overridden);
    debug!(
        matched = diagnostics.classification.matched,
        unmatched = diagnostics.classification.unmatched,
        excluded = diagnostics.classification.excluded_by_name,
        "Threshold join complete"
    );
    for warning in &diagnostics.warnings {
        warn!("{}", warning);
    }
}

fn record_metrics(result: &PipelineResult) {
    let diagnostics = &result.diagnostics;
    metrics::input::upload_processed(diagnostics.upload_rows, diagnostics.facility_count, diagnostics.long_rows);
    metrics::alerts::candidates(AlertLevel::HighAlert, diagnostics.classification.candidate_high_alerts);
    metrics::alerts::candidates(AlertLevel::Alert, diagnostics.classification.candidate_alerts);
    metrics::alerts::selected(result.selection.priority_count, result.selection.non_priority_count);
}
