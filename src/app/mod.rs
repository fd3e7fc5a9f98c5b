pub mod detect_alerts_use_case;
pub mod import_thresholds_use_case;
pub mod ports;

pub use detect_alerts_use_case::{DetectAlertsUseCase, DetectionOutcome};
pub use import_thresholds_use_case::ImportThresholdsUseCase;
