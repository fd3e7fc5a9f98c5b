use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_MAX_NON_PRIORITY, DEFAULT_MIN_DEVIATION, DISEASE_COLUMN_TOKEN, EXCLUDED_DISEASE_TOKEN,
    METADATA_COLUMNS, PERIOD_COLUMN, PRIORITY_DISEASES, YEAR_ROUND_DISEASES,
};
use crate::error::{AlertError, Result};
use crate::pipeline::processing::classify::ClassifierConfig;
use crate::pipeline::processing::normalize::NormalizerConfig;
use crate::pipeline::processing::parser::PatternSelection;
use crate::pipeline::processing::selection::{SelectionConfig, TruncationOrder};
use crate::pipeline::PipelineSettings;
use crate::types::DiseaseSet;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "OUTBREAK_ALERTS_CONFIG";
/// Config file picked up from the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "outbreak_alerts.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub schema: SchemaConfig,
    pub alerts: AlertsConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub thresholds_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            thresholds_dir: PathBuf::from("thresholds"),
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub dropped_columns: Vec<String>,
    pub disease_column_token: String,
    pub period_column: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dropped_columns: METADATA_COLUMNS.iter().map(|c| c.to_string()).collect(),
            disease_column_token: DISEASE_COLUMN_TOKEN.to_string(),
            period_column: PERIOD_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub priority_diseases: Vec<String>,
    pub year_round_diseases: Vec<String>,
    pub max_non_priority: usize,
    pub min_deviation: f64,
    pub excluded_disease_token: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            priority_diseases: PRIORITY_DISEASES.iter().map(|d| d.to_string()).collect(),
            year_round_diseases: YEAR_ROUND_DISEASES.iter().map(|d| d.to_string()).collect(),
            max_non_priority: DEFAULT_MAX_NON_PRIORITY,
            min_deviation: DEFAULT_MIN_DEVIATION,
            excluded_disease_token: EXCLUDED_DISEASE_TOKEN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub pattern_selection: PatternSelection,
    pub truncation: TruncationOrder,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `OUTBREAK_ALERTS_CONFIG` is
    /// consulted, then `outbreak_alerts.toml` in the working directory; with
    /// neither present the built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AlertError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema.disease_column_token.trim().is_empty() {
            return Err(AlertError::Config("schema.disease_column_token must not be empty".to_string()));
        }
        if self.schema.period_column.trim().is_empty() {
            return Err(AlertError::Config("schema.period_column must not be empty".to_string()));
        }
        if !self.alerts.min_deviation.is_finite() || self.alerts.min_deviation < 0.0 {
            return Err(AlertError::Config(format!(
                "alerts.min_deviation must be a non-negative number, got {}",
                self.alerts.min_deviation
            )));
        }
        Ok(())
    }

    /// Settings for the core pipeline
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            normalizer: NormalizerConfig {
                dropped_columns: self.schema.dropped_columns.clone(),
            },
            period_column: self.schema.period_column.clone(),
            pattern_selection: self.policy.pattern_selection,
            disease_column_token: self.schema.disease_column_token.clone(),
            year_round: DiseaseSet::new(self.alerts.year_round_diseases.iter().cloned()),
            classifier: ClassifierConfig {
                excluded_disease_token: self.alerts.excluded_disease_token.clone(),
                ..ClassifierConfig::default()
            },
            selection: SelectionConfig {
                priority: DiseaseSet::new(self.alerts.priority_diseases.iter().cloned()),
                max_non_priority: self.alerts.max_non_priority,
                min_deviation: self.alerts.min_deviation,
                truncation: self.policy.truncation,
            },
        }
    }
}
