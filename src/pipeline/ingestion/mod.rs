// Pipeline ingestion: in-memory upload tables and threshold tables

pub mod thresholds;
pub mod upload;

pub use thresholds::ThresholdTable;
pub use upload::RawTable;
