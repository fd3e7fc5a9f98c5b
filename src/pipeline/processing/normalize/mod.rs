use std::collections::HashSet;

use crate::constants::{FACILITY_ID_DELIMITER, HIERARCHY_COLUMNS, METADATA_COLUMNS, UNKNOWN};
use crate::error::{AlertError, Result};
use crate::pipeline::ingestion::RawTable;

/// A wide upload after schema normalization: metadata columns removed,
/// hierarchy cells filled, and a facility identifier per row
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// The upload with metadata columns dropped and hierarchy gaps filled
    pub table: RawTable,
    /// Composite facility identifier, aligned with `table.rows`
    pub facility_ids: Vec<String>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Keep only the rows whose mask entry is true, preserving order
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let rows = std::mem::take(&mut self.table.rows);
        let ids = std::mem::take(&mut self.facility_ids);
        for ((row, id), k) in rows.into_iter().zip(ids).zip(keep.iter()) {
            if *k {
                self.table.rows.push(row);
                self.facility_ids.push(id);
            }
        }
    }
}

/// Trait for turning a heterogeneous export into the canonical wide shape
pub trait SchemaNormalizer {
    /// Normalize the upload and report the number of distinct facilities
    fn normalize(&self, raw: RawTable) -> Result<(NormalizedTable, usize)>;
}

/// Configuration for schema normalization
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Columns removed when present
    pub dropped_columns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            dropped_columns: METADATA_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Default normalizer for the district health information export layout
#[derive(Debug, Clone, Default)]
pub struct DefaultSchemaNormalizer {
    pub config: NormalizerConfig,
}

impl DefaultSchemaNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Replace missing hierarchy cells with the sentinel, in every hierarchy
    /// column that exists
    fn fill_hierarchy(table: &mut RawTable) {
        for name in HIERARCHY_COLUMNS {
            if let Some(idx) = table.column_index(name) {
                for row in &mut table.rows {
                    if row[idx].is_none() {
                        row[idx] = Some(UNKNOWN.to_string());
                    }
                }
            }
        }
    }

    fn facility_ids(table: &RawTable, indices: &[usize]) -> Vec<String> {
        (0..table.len())
            .map(|row| {
                indices
                    .iter()
                    .map(|&col| table.cell(row, col).unwrap_or(UNKNOWN))
                    .collect::<Vec<_>>()
                    .join(FACILITY_ID_DELIMITER)
            })
            .collect()
    }
}

impl SchemaNormalizer for DefaultSchemaNormalizer {
    fn normalize(&self, mut raw: RawTable) -> Result<(NormalizedTable, usize)> {
        raw.drop_columns(&self.config.dropped_columns);
        Self::fill_hierarchy(&mut raw);

        let missing: Vec<String> = HIERARCHY_COLUMNS
            .iter()
            .filter(|name| !raw.has_column(name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AlertError::Schema { missing });
        }
        if raw.is_empty() {
            return Err(AlertError::EmptyResult { stage: "upload" });
        }

        let indices: Vec<usize> = HIERARCHY_COLUMNS
            .iter()
            .filter_map(|name| raw.column_index(name))
            .collect();
        let facility_ids = Self::facility_ids(&raw, &indices);
        let facility_count = facility_ids.iter().collect::<HashSet<_>>().len();

        Ok((
            NormalizedTable {
                table: raw,
                facility_ids,
            },
            facility_count,
        ))
    }
}

/// Normalize with the default metadata column list
pub fn normalize(raw: RawTable) -> Result<(NormalizedTable, usize)> {
    DefaultSchemaNormalizer::new().normalize(raw)
}
