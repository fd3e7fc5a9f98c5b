use serde::Serialize;

use crate::constants::DISEASE_COLUMN_TOKEN;
use crate::error::{AlertError, Result};
use crate::pipeline::processing::parser::PeriodTable;
use crate::types::{LongObservation, Season};

/// Decides which upload columns hold per-disease case counts
pub trait DiseaseColumnMatcher {
    fn is_disease_column(&self, column: &str) -> bool;
}

impl<F> DiseaseColumnMatcher for F
where
    F: Fn(&str) -> bool,
{
    fn is_disease_column(&self, column: &str) -> bool {
        self(column)
    }
}

/// Case-insensitive substring match on a naming token such as "(New Cases)"
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    token: String,
}

impl TokenMatcher {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_lowercase(),
        }
    }
}

impl Default for TokenMatcher {
    fn default() -> Self {
        Self::new(DISEASE_COLUMN_TOKEN)
    }
}

impl DiseaseColumnMatcher for TokenMatcher {
    fn is_disease_column(&self, column: &str) -> bool {
        column.to_lowercase().contains(&self.token)
    }
}

/// Period-parsed upload with the run season attached to every row
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonedTable {
    pub table: PeriodTable,
    pub season: Season,
}

/// A negative case count that was accepted as-is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeCell {
    pub facility_id: String,
    pub disease: String,
    pub cases: i64,
}

/// Long-format observations plus what the reshape saw along the way
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub observations: Vec<LongObservation>,
    pub disease_columns: Vec<String>,
    pub negative_cells: Vec<NegativeCell>,
}

fn coerce_cases(cell: Option<&str>, column: &str, row: usize) -> Result<i64> {
    let Some(text) = cell.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(0);
    };
    if let Ok(value) = text.parse::<i64>() {
        return Ok(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(0),
        Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
        _ => Err(AlertError::InvalidCaseCount {
            column: column.to_string(),
            row: row + 1,
            value: text.to_string(),
        }),
    }
}

/// Expand each wide row into one observation per disease column.
///
/// Output is disease-major: every row of the first disease column, then every
/// row of the next. That order is what the selector later treats as arrival
/// order.
pub fn reshape(table: &SeasonedTable, matcher: &dyn DiseaseColumnMatcher) -> Result<LongTable> {
    let wide = &table.table.normalized;
    let disease_columns: Vec<(usize, &String)> = wide
        .table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| matcher.is_disease_column(name))
        .collect();
    if disease_columns.is_empty() {
        return Err(AlertError::NoDiseaseColumns);
    }

    let mut observations = Vec::with_capacity(wide.len() * disease_columns.len());
    let mut negative_cells = Vec::new();

    for &(col, disease) in &disease_columns {
        for (row, facility_id) in wide.facility_ids.iter().enumerate() {
            let cases = coerce_cases(wide.table.cell(row, col), disease, row)?;
            if cases < 0 {
                negative_cells.push(NegativeCell {
                    facility_id: facility_id.clone(),
                    disease: disease.clone(),
                    cases,
                });
            }
            observations.push(LongObservation {
                facility_id: facility_id.clone(),
                season: table.season,
                disease: disease.clone(),
                cases,
            });
        }
    }

    Ok(LongTable {
        observations,
        disease_columns: disease_columns.into_iter().map(|(_, name)| name.clone()).collect(),
        negative_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::RawTable;
    use crate::pipeline::processing::normalize::NormalizedTable;
    use crate::pipeline::processing::parser::{PatternSelection, PeriodParseReport};
    use crate::types::Period;

    fn seasoned(headers: &[&str], rows: Vec<Vec<Option<&str>>>) -> SeasonedTable {
        let n = rows.len();
        SeasonedTable {
            table: PeriodTable {
                normalized: NormalizedTable {
                    table: RawTable::new(
                        headers.iter().map(|h| h.to_string()).collect(),
                        rows.into_iter()
                            .map(|r| r.into_iter().map(|c| c.map(String::from)).collect())
                            .collect(),
                    ),
                    facility_ids: (0..n).map(|i| format!("F{}", i)).collect(),
                },
                periods: vec![Period { year: 2023, week: 5 }; n],
                report: PeriodParseReport {
                    policy: PatternSelection::BestOfAll,
                    attempts: Vec::new(),
                    selected_pattern: "iso_week".to_string(),
                    dropped_rows: 0,
                },
            },
            season: Season::Winter,
        }
    }

    #[test]
    fn test_row_count_is_wide_rows_times_disease_columns() {
        let table = seasoned(
            &["periodname", "Measles (New Cases)", "Malaria (New cases)", "Notes"],
            vec![
                vec![Some("2023W5"), Some("3"), None, Some("x")],
                vec![Some("2023W5"), Some("1.0"), Some("7"), None],
                vec![Some("2023W5"), None, None, None],
            ],
        );

        let long = reshape(&table, &TokenMatcher::default()).unwrap();

        assert_eq!(long.disease_columns, vec!["Measles (New Cases)", "Malaria (New cases)"]);
        assert_eq!(long.observations.len(), 3 * 2);
        assert_eq!(long.observations[0].cases, 3);
        assert_eq!(long.observations[1].cases, 1);
        assert_eq!(long.observations[2].cases, 0);
        assert_eq!(long.observations[3].disease, "Malaria (New cases)");
        assert_eq!(long.observations[3].cases, 0);
        assert_eq!(long.observations[4].cases, 7);
        assert!(long.observations.iter().all(|o| o.season == Season::Winter));
    }

    #[test]
    fn test_no_disease_columns() {
        let table = seasoned(&["periodname", "Notes"], vec![vec![Some("2023W5"), None]]);

        assert!(matches!(
            reshape(&table, &TokenMatcher::default()),
            Err(AlertError::NoDiseaseColumns)
        ));
    }

    #[test]
    fn test_custom_matcher_closure() {
        let table = seasoned(&["cases_measles", "cases_malaria", "Notes"], vec![vec![Some("2"), Some("4"), None]]);
        let matcher = |column: &str| column.starts_with("cases_");

        let long = reshape(&table, &matcher).unwrap();

        assert_eq!(long.observations.len(), 2);
    }

    #[test]
    fn test_negative_counts_are_kept_and_reported() {
        let table = seasoned(&["Measles (New Cases)"], vec![vec![Some("-2")]]);

        let long = reshape(&table, &TokenMatcher::default()).unwrap();

        assert_eq!(long.observations[0].cases, -2);
        assert_eq!(long.negative_cells.len(), 1);
    }

    #[test]
    fn test_null_marker_count_is_zero() {
        let data = "Measles (New Cases),Malaria (New Cases)\n20,NA\n";
        let raw = RawTable::from_csv_reader(data.as_bytes()).unwrap();
        let cells: Vec<Option<&str>> = (0..2).map(|col| raw.cell(0, col)).collect();
        let table = seasoned(&["Measles (New Cases)", "Malaria (New Cases)"], vec![cells]);

        let long = reshape(&table, &TokenMatcher::default()).unwrap();

        assert_eq!(long.observations[0].cases, 20);
        assert_eq!(long.observations[1].cases, 0);
    }

    #[test]
    fn test_non_numeric_count_is_rejected() {
        let table = seasoned(&["Measles (New Cases)"], vec![vec![Some("twelve")]]);

        assert!(matches!(
            reshape(&table, &TokenMatcher::default()),
            Err(AlertError::InvalidCaseCount { .. })
        ));
    }
}
