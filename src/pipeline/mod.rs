// Alert detection pipeline: ingestion, processing, storage, and output

pub mod ingestion;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod storage;

// Re-export key types from each stage
pub use ingestion::{RawTable, ThresholdTable};
pub use pipeline::{AlertPipeline, PipelineResult, PipelineSettings, RunDiagnostics};
