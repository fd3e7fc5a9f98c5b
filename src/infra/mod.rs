pub mod alert_output_adapter;
pub mod report_output_adapter;
pub mod threshold_source_adapter;
pub mod upload_source_adapter;

pub use alert_output_adapter::CsvAlertOutputAdapter;
pub use report_output_adapter::JsonReportOutputAdapter;
pub use threshold_source_adapter::{FileThresholdSource, StoreThresholdSource};
pub use upload_source_adapter::FileUploadSource;
