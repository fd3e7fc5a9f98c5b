pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

// Application use cases and the adapters that plug into their ports
pub mod app;
pub mod infra;

// Core stage entry points, in pipeline order
pub use pipeline::processing::classify::match_and_classify;
pub use pipeline::processing::normalize::normalize;
pub use pipeline::processing::parser::parse_period;
pub use pipeline::processing::reshape::reshape;
pub use pipeline::processing::season::{apply_year_round_override, classify_season};
pub use pipeline::processing::selection::select_alerts;

pub use error::{AlertError, Result};
pub use pipeline::{AlertPipeline, PipelineResult, PipelineSettings, RawTable, RunDiagnostics, ThresholdTable};
pub use types::{Alert, AlertLevel, DiseaseSet, LongObservation, Period, Season, ThresholdRecord};
