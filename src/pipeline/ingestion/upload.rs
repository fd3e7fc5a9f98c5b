use std::io::Read;

use crate::constants::NULL_TOKENS;
use crate::error::{AlertError, Result};

/// A wide surveillance export held in memory: one row per facility per period.
/// Empty cells and the usual null markers (`NA`, `N/A`, `NULL`, `nan`, ...)
/// are `None`; everything else is kept as text until a stage decides how to
/// coerce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV export with a header row. Short rows are padded with missing
    /// cells; a row wider than the header is rejected.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() > width {
                return Err(AlertError::MalformedRow {
                    row: index + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row: Vec<Option<String>> = record.iter().map(parse_cell).collect();
            row.resize(width, None);
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at (row, column), `None` when missing
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Remove every listed column that is present; absent names are ignored
    pub fn drop_columns(&mut self, names: &[String]) -> usize {
        let keep: Vec<bool> = self.headers.iter().map(|h| !names.contains(h)).collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped == 0 {
            return 0;
        }

        self.headers = retain_by_mask(std::mem::take(&mut self.headers), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        dropped
    }
}

fn parse_cell(cell: &str) -> Option<String> {
    if NULL_TOKENS.contains(&cell) {
        None
    } else {
        Some(cell.to_string())
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(item, k)| if *k { Some(item) } else { None })
        .collect()
}
