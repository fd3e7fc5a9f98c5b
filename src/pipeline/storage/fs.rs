use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{resolve_province, ThresholdStore};
use crate::constants::threshold_file_name;
use crate::error::{AlertError, Result};
use crate::pipeline::ingestion::ThresholdTable;

/// Threshold tables stored as `seasonal_thresholds_<slug>.csv` in one directory
#[derive(Debug, Clone)]
pub struct FsThresholdStore {
    root: PathBuf,
}

impl FsThresholdStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a province under the naming convention
    pub fn path_for(&self, province: &str) -> Result<PathBuf> {
        let province = resolve_province(province)?;
        Ok(self.root.join(threshold_file_name(province)))
    }
}

impl ThresholdStore for FsThresholdStore {
    fn load(&self, province: &str) -> Result<ThresholdTable> {
        let path = self.path_for(province)?;
        if !path.is_file() {
            return Err(AlertError::ThresholdsNotFound {
                province: resolve_province(province)?.to_string(),
                path,
            });
        }
        ThresholdTable::from_csv_reader(File::open(&path)?)
    }

    fn import(&self, province: &str, table: &ThresholdTable) -> Result<String> {
        let path = self.path_for(province)?;
        fs::create_dir_all(&self.root)?;

        // Canonical name only ever holds a complete table
        let staging = path.with_extension("csv.tmp");
        table.write_csv(File::create(&staging)?)?;
        fs::rename(&staging, &path)?;

        Ok(path.display().to_string())
    }

    fn contains(&self, province: &str) -> bool {
        self.path_for(province).map(|p| p.is_file()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Season, ThresholdRecord};

    fn table(t95: f64) -> ThresholdTable {
        ThresholdTable::new(vec![ThresholdRecord {
            facility_id: "F1".to_string(),
            disease: "Measles (New Cases)".to_string(),
            season: Season::Winter,
            mean: Some(1.0),
            sd: None,
            threshold_95: Some(t95),
            threshold_99: None,
        }])
    }

    #[test]
    fn test_import_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsThresholdStore::new(dir.path().join("thresholds"));

        let location = store.import("Gilgit Baltistan", &table(8.0)).unwrap();

        assert!(location.ends_with("seasonal_thresholds_gilgit_baltistan.csv"));
        assert!(store.contains("gilgit baltistan"));
        assert_eq!(store.load("Gilgit Baltistan").unwrap(), table(8.0));
    }

    #[test]
    fn test_latest_import_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsThresholdStore::new(dir.path());

        store.import("Sindh", &table(8.0)).unwrap();
        store.import("Sindh", &table(11.0)).unwrap();

        let loaded = store.load("Sindh").unwrap();
        assert_eq!(loaded.records()[0].threshold_95, Some(11.0));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsThresholdStore::new(dir.path());

        assert!(!store.contains("AJK"));
        assert!(matches!(
            store.load("AJK"),
            Err(AlertError::ThresholdsNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_province() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsThresholdStore::new(dir.path());

        assert!(matches!(
            store.import("Atlantis", &table(1.0)),
            Err(AlertError::UnknownProvince(_))
        ));
    }
}
