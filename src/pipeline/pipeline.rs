use serde::Serialize;

use crate::constants::{DISEASE_COLUMN_TOKEN, PERIOD_COLUMN, PRIORITY_DISEASES, YEAR_ROUND_DISEASES};
use crate::constants::{DEFAULT_MAX_NON_PRIORITY, DEFAULT_MIN_DEVIATION};
use crate::error::Result;
use crate::pipeline::ingestion::{RawTable, ThresholdTable};
use crate::pipeline::processing::classify::{
    AlertClassifier, ClassificationSummary, ClassifierConfig, DefaultAlertClassifier,
};
use crate::pipeline::processing::normalize::{DefaultSchemaNormalizer, NormalizerConfig, SchemaNormalizer};
use crate::pipeline::processing::parser::{PatternSelection, PeriodParseReport, PeriodParser, DEFAULT_PATTERNS};
use crate::pipeline::processing::reshape::{reshape, DiseaseColumnMatcher, SeasonedTable, TokenMatcher};
use crate::pipeline::processing::season::{apply_year_round_override, classify_season, overridden_disease_count};
use crate::pipeline::processing::selection::{select_alerts, AlertSelection, SelectionConfig, TruncationOrder};
use crate::types::{DiseaseSet, Period, Season};

/// Everything a single run needs besides its two input tables
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub normalizer: NormalizerConfig,
    pub period_column: String,
    pub pattern_selection: PatternSelection,
    pub disease_column_token: String,
    pub year_round: DiseaseSet,
    pub classifier: ClassifierConfig,
    pub selection: SelectionConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            period_column: PERIOD_COLUMN.to_string(),
            pattern_selection: PatternSelection::default(),
            disease_column_token: DISEASE_COLUMN_TOKEN.to_string(),
            year_round: DiseaseSet::new(YEAR_ROUND_DISEASES.iter().copied()),
            classifier: ClassifierConfig::default(),
            selection: SelectionConfig {
                priority: DiseaseSet::new(PRIORITY_DISEASES.iter().copied()),
                max_non_priority: DEFAULT_MAX_NON_PRIORITY,
                min_deviation: DEFAULT_MIN_DEVIATION,
                truncation: TruncationOrder::default(),
            },
        }
    }
}

/// Counters and notes describing one run, returned instead of logged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunDiagnostics {
    pub upload_rows: usize,
    pub facility_count: usize,
    pub period: PeriodParseReport,
    pub reporting_year: i32,
    pub reporting_week: u32,
    pub season: Season,
    pub mixed_week_rows: usize,
    pub disease_columns: usize,
    pub long_rows: usize,
    pub year_round_overridden: usize,
    pub classification: ClassificationSummary,
    pub priority_count: usize,
    pub non_priority_count: usize,
    pub total_alerts: usize,
    pub warnings: Vec<String>,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub selection: AlertSelection,
    pub period: Period,
    pub season: Season,
    pub diagnostics: RunDiagnostics,
}

/// Runs normalize → parse → season → reshape → override → classify → select.
/// Stages run to completion in order and the first failure aborts the run.
pub struct AlertPipeline {
    settings: PipelineSettings,
    matcher: Box<dyn DiseaseColumnMatcher>,
}

impl AlertPipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        let matcher = TokenMatcher::new(&settings.disease_column_token);
        Self {
            settings,
            matcher: Box::new(matcher),
        }
    }

    /// Replace the disease column matcher
    pub fn with_matcher(mut self, matcher: Box<dyn DiseaseColumnMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn run(&self, raw: RawTable, thresholds: &ThresholdTable) -> Result<PipelineResult> {
        let upload_rows = raw.len();
        let mut warnings = Vec::new();

        let normalizer = DefaultSchemaNormalizer::with_config(self.settings.normalizer.clone());
        let (normalized, facility_count) = normalizer.normalize(raw)?;

        let parser = PeriodParser::with_patterns(
            &DEFAULT_PATTERNS,
            &self.settings.period_column,
            self.settings.pattern_selection,
        );
        let (period_table, reporting_week) = parser.parse(normalized)?;
        let period = period_table.reporting_period().unwrap_or(Period {
            year: 0,
            week: reporting_week,
        });

        let mixed_week_rows = period_table.mixed_week_rows();
        if mixed_week_rows > 0 {
            warnings.push(format!(
                "{} rows report a week other than week {}; the whole upload is treated as week {}",
                mixed_week_rows, reporting_week, reporting_week
            ));
        }

        let season = classify_season(Some(reporting_week));
        let seasoned = SeasonedTable {
            table: period_table,
            season,
        };

        let long = reshape(&seasoned, self.matcher.as_ref())?;
        for cell in &long.negative_cells {
            warnings.push(format!(
                "negative case count {} for {} at {}",
                cell.cases, cell.disease, cell.facility_id
            ));
        }
        let disease_columns = long.disease_columns.len();
        let observations = apply_year_round_override(long.observations, &self.settings.year_round);
        let year_round_overridden = overridden_disease_count(&observations, &self.settings.year_round);

        if thresholds.is_empty() {
            warnings.push("threshold table is empty; no observation can raise an alert".to_string());
        }
        if thresholds.skipped_rows() > 0 {
            warnings.push(format!(
                "{} threshold rows have an unrecognized season and were skipped",
                thresholds.skipped_rows()
            ));
        }
        let classifier = DefaultAlertClassifier::with_config(self.settings.classifier.clone());
        let outcome = classifier.match_and_classify(&observations, thresholds, season);

        let selection = select_alerts(outcome.candidates, &self.settings.selection);

        let diagnostics = RunDiagnostics {
            upload_rows,
            facility_count,
            period: seasoned.table.report.clone(),
            reporting_year: period.year,
            reporting_week,
            season,
            mixed_week_rows,
            disease_columns,
            long_rows: observations.len(),
            year_round_overridden,
            classification: outcome.summary,
            priority_count: selection.priority_count,
            non_priority_count: selection.non_priority_count,
            total_alerts: selection.total(),
            warnings,
        };

        Ok(PipelineResult {
            selection,
            period,
            season,
            diagnostics,
        })
    }
}

impl Default for AlertPipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}
