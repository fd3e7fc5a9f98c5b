use std::collections::HashMap;

use serde::Serialize;

use crate::constants::EXCLUDED_DISEASE_TOKEN;
use crate::pipeline::ingestion::ThresholdTable;
use crate::types::{Alert, AlertLevel, LongObservation, Season, ThresholdRecord};

/// Tier and deviation for a case count against optional thresholds.
///
/// The 99th percentile check runs first, so a row above both thresholds is a
/// `HighAlert` measured against `threshold_99`. Missing thresholds never fire.
pub fn classify(cases: i64, threshold_95: Option<f64>, threshold_99: Option<f64>) -> (AlertLevel, f64) {
    let cases = cases as f64;
    match (threshold_95, threshold_99) {
        (_, Some(t99)) if cases > t99 => (AlertLevel::HighAlert, cases - t99),
        (Some(t95), _) if cases > t95 => (AlertLevel::Alert, cases - t95),
        _ => (AlertLevel::Normal, 0.0),
    }
}

/// Configuration for the candidate-alert filter
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Diseases whose name contains this literal are never reported
    pub excluded_disease_token: String,
    /// Smallest deviation a candidate may carry
    pub min_candidate_deviation: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            excluded_disease_token: EXCLUDED_DISEASE_TOKEN.to_string(),
            min_candidate_deviation: 1.0,
        }
    }
}

/// Counts gathered while joining and classifying
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationSummary {
    pub observations: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub high_alerts: usize,
    pub alerts: usize,
    pub excluded_by_name: usize,
    pub candidates: usize,
    /// Candidates by level, after the filter
    pub candidate_high_alerts: usize,
    pub candidate_alerts: usize,
}

/// Candidate alerts in join order plus the summary
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOutcome {
    pub candidates: Vec<Alert>,
    pub summary: ClassificationSummary,
}

/// Trait for joining observations to thresholds and picking candidate alerts
pub trait AlertClassifier {
    fn match_and_classify(
        &self,
        long: &[LongObservation],
        thresholds: &ThresholdTable,
        season: Season,
    ) -> ClassificationOutcome;
}

type ThresholdKey<'a> = (&'a str, &'a str, Season);

/// Lookup over the thresholds usable in one season
struct ThresholdIndex<'t> {
    by_key: HashMap<ThresholdKey<'t>, Vec<&'t ThresholdRecord>>,
}

impl<'t> ThresholdIndex<'t> {
    fn for_season(thresholds: &'t ThresholdTable, season: Season) -> Self {
        let mut by_key: HashMap<ThresholdKey<'t>, Vec<&'t ThresholdRecord>> = HashMap::new();
        for record in thresholds.candidates_for(season) {
            by_key
                .entry((record.facility_id.as_str(), record.disease.as_str(), record.season))
                .or_default()
                .push(record);
        }
        Self { by_key }
    }

    fn lookup<'a>(&'a self, obs: &'a LongObservation) -> &'a [&'t ThresholdRecord] {
        self.by_key
            .get(&(obs.facility_id.as_str(), obs.disease.as_str(), obs.season))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn build_alert(obs: &LongObservation, record: Option<&ThresholdRecord>) -> Alert {
    let threshold_95 = record.and_then(|r| r.threshold_95);
    let threshold_99 = record.and_then(|r| r.threshold_99);
    let (alert_level, deviation) = classify(obs.cases, threshold_95, threshold_99);
    Alert {
        facility_id: obs.facility_id.clone(),
        disease: obs.disease.clone(),
        season: obs.season,
        cases: obs.cases,
        mean: record.and_then(|r| r.mean),
        sd: record.and_then(|r| r.sd),
        threshold_95,
        threshold_99,
        alert_level,
        deviation,
    }
}

/// One joined row and whether a threshold record was found for it
struct JoinedRow {
    alert: Alert,
    matched: bool,
}

fn left_join(long: &[LongObservation], thresholds: &ThresholdTable, season: Season) -> Vec<JoinedRow> {
    let index = ThresholdIndex::for_season(thresholds, season);
    let mut joined = Vec::with_capacity(long.len());
    for obs in long {
        let matches = index.lookup(obs);
        if matches.is_empty() {
            joined.push(JoinedRow {
                alert: build_alert(obs, None),
                matched: false,
            });
        } else {
            joined.extend(matches.iter().map(|&record| JoinedRow {
                alert: build_alert(obs, Some(record)),
                matched: true,
            }));
        }
    }
    joined
}

/// Left join of observations onto the season-restricted thresholds.
///
/// An observation with several matching threshold rows yields one alert per
/// row; an unmatched observation yields one `Normal` alert with no thresholds.
pub fn join_and_classify(long: &[LongObservation], thresholds: &ThresholdTable, season: Season) -> Vec<Alert> {
    left_join(long, thresholds, season)
        .into_iter()
        .map(|row| row.alert)
        .collect()
}

/// Default classifier: two-tier thresholds, "Other" exclusion, deviation floor
#[derive(Debug, Clone, Default)]
pub struct DefaultAlertClassifier {
    pub config: ClassifierConfig,
}

impl DefaultAlertClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClassifierConfig) -> Self {
        Self { config }
    }

    fn excluded_by_name(&self, alert: &Alert) -> bool {
        !self.config.excluded_disease_token.is_empty()
            && alert.disease.contains(&self.config.excluded_disease_token)
    }

    /// Whether a classified row is reported as a candidate alert
    pub fn is_candidate(&self, alert: &Alert) -> bool {
        alert.alert_level != AlertLevel::Normal
            && alert.threshold_95.is_some()
            && alert.deviation >= self.config.min_candidate_deviation
            && !self.excluded_by_name(alert)
    }
}

impl AlertClassifier for DefaultAlertClassifier {
    fn match_and_classify(
        &self,
        long: &[LongObservation],
        thresholds: &ThresholdTable,
        season: Season,
    ) -> ClassificationOutcome {
        let joined = left_join(long, thresholds, season);
        let mut summary = ClassificationSummary {
            observations: long.len(),
            ..Default::default()
        };

        let mut candidates = Vec::new();
        for JoinedRow { alert, matched } in joined {
            if matched {
                summary.matched += 1;
            } else {
                summary.unmatched += 1;
            }
            match alert.alert_level {
                AlertLevel::HighAlert => summary.high_alerts += 1,
                AlertLevel::Alert => summary.alerts += 1,
                AlertLevel::Normal => {}
            }

            if self.is_candidate(&alert) {
                match alert.alert_level {
                    AlertLevel::HighAlert => summary.candidate_high_alerts += 1,
                    _ => summary.candidate_alerts += 1,
                }
                candidates.push(alert);
            } else if alert.alert_level != AlertLevel::Normal && self.excluded_by_name(&alert) {
                summary.excluded_by_name += 1;
            }
        }
        summary.candidates = candidates.len();

        ClassificationOutcome { candidates, summary }
    }
}

/// Join, classify, and keep the candidate alerts with the default filter
pub fn match_and_classify(long: &[LongObservation], thresholds: &ThresholdTable, season: Season) -> Vec<Alert> {
    DefaultAlertClassifier::new()
        .match_and_classify(long, thresholds, season)
        .candidates
}
