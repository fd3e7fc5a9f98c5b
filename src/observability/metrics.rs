//! Prometheus metrics for alert runs.
//!
//! Recording functions are grouped by phase. Without an installed recorder
//! every call is a no-op, so the library can be used and tested without
//! calling [`init`].

use std::fmt;
use std::sync::OnceLock;

use anyhow::anyhow;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Every metric the crate records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Run metrics
    RunsTotal,
    RunFailures,
    RunDuration,

    // Input metrics
    UploadRows,
    Facilities,
    LongRows,

    // Alert metrics
    AlertCandidates,
    AlertsSelected,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsTotal => "outbreak_runs_total",
            MetricName::RunFailures => "outbreak_run_failures_total",
            MetricName::RunDuration => "outbreak_run_duration_seconds",
            MetricName::UploadRows => "outbreak_upload_rows",
            MetricName::Facilities => "outbreak_facilities",
            MetricName::LongRows => "outbreak_long_rows",
            MetricName::AlertCandidates => "outbreak_alert_candidates_total",
            MetricName::AlertsSelected => "outbreak_alerts_selected_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RunsTotal,
            RunFailures,
            RunDuration,
            UploadRows,
            Facilities,
            LongRows,
            AlertCandidates,
            AlertsSelected,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is an error.
pub fn init() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow!("Metrics recorder already initialized"))?;
    tracing::debug!("Metrics recorder installed");
    Ok(())
}

/// Prometheus text snapshot, `None` before [`init`]
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Run Metrics
// ============================================================================

pub mod run {
    use super::MetricName;

    pub fn started() {
        ::metrics::counter!(MetricName::RunsTotal.as_str()).increment(1);
    }

    /// Record a failed run, labelled with the error kind
    pub fn failed(kind: &'static str) {
        ::metrics::counter!(MetricName::RunFailures.as_str(), "kind" => kind).increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Input Metrics
// ============================================================================

pub mod input {
    use super::MetricName;

    /// Record the shape of one processed upload
    pub fn upload_processed(upload_rows: usize, facilities: usize, long_rows: usize) {
        ::metrics::histogram!(MetricName::UploadRows.as_str()).record(upload_rows as f64);
        ::metrics::histogram!(MetricName::Facilities.as_str()).record(facilities as f64);
        ::metrics::histogram!(MetricName::LongRows.as_str()).record(long_rows as f64);
    }
}

// ============================================================================
// Alert Metrics
// ============================================================================

pub mod alerts {
    use super::MetricName;
    use crate::types::AlertLevel;

    /// Record candidate alerts by level
    pub fn candidates(level: AlertLevel, count: usize) {
        let level = match level {
            AlertLevel::Normal => "normal",
            AlertLevel::Alert => "alert",
            AlertLevel::HighAlert => "high_alert",
        };
        ::metrics::counter!(MetricName::AlertCandidates.as_str(), "level" => level).increment(count as u64);
    }

    /// Record selected alerts by tier ("priority" or "filtered")
    pub fn selected(priority: usize, filtered: usize) {
        ::metrics::counter!(MetricName::AlertsSelected.as_str(), "tier" => "priority").increment(priority as u64);
        ::metrics::counter!(MetricName::AlertsSelected.as_str(), "tier" => "filtered").increment(filtered as u64);
    }
}
