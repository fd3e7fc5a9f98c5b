use std::io::{Read, Write};

use serde::Deserialize;

use crate::constants::THRESHOLD_COLUMNS;
use crate::error::{AlertError, Result};
use crate::types::{Season, ThresholdRecord};

/// Province threshold table, read-only for the duration of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    records: Vec<ThresholdRecord>,
    skipped_rows: usize,
}

/// A threshold row as written, before its season is recognized
#[derive(Debug, Deserialize)]
struct ThresholdRow {
    #[serde(rename = "Facility_ID")]
    facility_id: String,
    #[serde(rename = "Disease")]
    disease: String,
    #[serde(rename = "Season")]
    season: String,
    #[serde(rename = "Mean")]
    mean: Option<f64>,
    #[serde(rename = "SD")]
    sd: Option<f64>,
    #[serde(rename = "Threshold_95")]
    threshold_95: Option<f64>,
    #[serde(rename = "Threshold_99")]
    threshold_99: Option<f64>,
}

impl ThresholdRow {
    fn into_record(self) -> Option<ThresholdRecord> {
        let season = self.season.parse::<Season>().ok()?;
        Some(ThresholdRecord {
            facility_id: self.facility_id,
            disease: self.disease,
            season,
            mean: self.mean,
            sd: self.sd,
            threshold_95: self.threshold_95,
            threshold_99: self.threshold_99,
        })
    }
}

impl ThresholdTable {
    pub fn new(records: Vec<ThresholdRecord>) -> Self {
        Self {
            records,
            skipped_rows: 0,
        }
    }

    /// Read a threshold CSV. Columns beyond the required seven are ignored;
    /// empty statistic cells become `None`. A row whose season is not one of
    /// the known labels (surrounding whitespace allowed) can never match an
    /// observation, so it is skipped and counted in `skipped_rows`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let missing: Vec<&str> = THRESHOLD_COLUMNS
            .iter()
            .copied()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .collect();
        if !missing.is_empty() {
            return Err(AlertError::InvalidThresholds(format!(
                "missing columns: {}",
                missing.join(", ")
            )));
        }

        let mut records = Vec::new();
        let mut skipped_rows = 0;
        for row in csv_reader.deserialize::<ThresholdRow>() {
            match row?.into_record() {
                Some(record) => records.push(record),
                None => skipped_rows += 1,
            }
        }

        Ok(Self { records, skipped_rows })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.records.is_empty() {
            csv_writer.write_record(THRESHOLD_COLUMNS)?;
        }
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> &[ThresholdRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped on read because their season was not recognized
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Records usable for a run in `season`: that season plus the year-round bucket
    pub fn candidates_for(&self, season: Season) -> impl Iterator<Item = &ThresholdRecord> {
        self.records
            .iter()
            .filter(move |r| r.season == season || r.season == Season::YearRound)
    }
}
