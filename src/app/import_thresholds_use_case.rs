use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::pipeline::ingestion::ThresholdTable;
use crate::pipeline::storage::{resolve_province, ThresholdStore};

/// Result of storing a threshold table for a province
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub province: &'static str,
    pub records: usize,
    pub location: String,
}

/// Use case for validating a threshold CSV and storing it as the province's
/// current table
pub struct ImportThresholdsUseCase<S: ThresholdStore> {
    store: S,
}

impl<S: ThresholdStore> ImportThresholdsUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn import_file(&self, province: &str, path: &Path) -> Result<ImportOutcome> {
        let file = File::open(path).with_context(|| format!("Failed to open threshold file {}", path.display()))?;
        self.import_reader(province, file)
            .with_context(|| format!("Failed to import {}", path.display()))
    }

    /// Parse, validate and store. Nothing is stored when parsing fails.
    pub fn import_reader<R: Read>(&self, province: &str, reader: R) -> Result<ImportOutcome> {
        let province = resolve_province(province)?;
        let table = ThresholdTable::from_csv_reader(reader)?;
        if table.is_empty() {
            warn!("Threshold table for {} has no rows", province);
        }
        if table.skipped_rows() > 0 {
            warn!(
                "Skipped {} threshold rows for {} with an unrecognized season",
                table.skipped_rows(),
                province
            );
        }

        let replacing = self.store.contains(province);
        let location = self.store.import(province, &table)?;
        if replacing {
            info!("Replaced thresholds for {} at {}", province, location);
        } else {
            info!("Stored thresholds for {} at {}", province, location);
        }

        Ok(ImportOutcome {
            province,
            records: table.len(),
            location,
        })
    }
}
