use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::ports::ThresholdSourcePort;
use crate::pipeline::ingestion::ThresholdTable;
use crate::pipeline::storage::ThresholdStore;

/// Thresholds from the province store
pub struct StoreThresholdSource<S: ThresholdStore> {
    store: S,
}

impl<S: ThresholdStore> StoreThresholdSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ThresholdStore> ThresholdSourcePort for StoreThresholdSource<S> {
    fn load_thresholds(&self, province: &str) -> Result<ThresholdTable> {
        Ok(self.store.load(province)?)
    }
}

/// Thresholds from an explicit file, regardless of province
pub struct FileThresholdSource {
    path: PathBuf,
}

impl FileThresholdSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ThresholdSourcePort for FileThresholdSource {
    fn load_thresholds(&self, _province: &str) -> Result<ThresholdTable> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open threshold file {}", self.path.display()))?;
        ThresholdTable::from_csv_reader(file)
            .with_context(|| format!("Failed to read threshold file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use crate::pipeline::storage::InMemoryThresholdStore;

    #[test]
    fn test_store_source_surfaces_missing_province() {
        let source = StoreThresholdSource::new(InMemoryThresholdStore::new());

        let err = source.load_thresholds("Balochistan").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AlertError>(),
            Some(AlertError::ThresholdsNotFound { .. })
        ));
    }

    #[test]
    fn test_file_source_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(
            &path,
            "Facility_ID,Disease,Season,Mean,SD,Threshold_95,Threshold_99\nF1,Measles (New Cases),Summer,1,1,3,4\n",
        )
        .unwrap();

        let table = FileThresholdSource::new(&path).load_thresholds("AJK").unwrap();

        assert_eq!(table.len(), 1);
    }
}
