use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::PERIOD_COLUMN;
use crate::error::{AlertError, NoPeriodMatchReason, Result};
use crate::pipeline::processing::normalize::NormalizedTable;
use crate::types::Period;

/// Which capture group holds the year and which the week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    YearWeek,
    WeekYear,
}

/// One candidate shape of a period label
#[derive(Debug, Clone)]
pub struct PeriodPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub order: FieldOrder,
}

impl PeriodPattern {
    /// Raw (year, week) text from the first match in `label`
    pub fn extract<'a>(&self, label: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.regex.captures(label)?;
        let first = caps.get(1)?.as_str();
        let second = caps.get(2)?.as_str();
        match self.order {
            FieldOrder::YearWeek => Some((first, second)),
            FieldOrder::WeekYear => Some((second, first)),
        }
    }
}

/// Label patterns in evaluation order
pub static DEFAULT_PATTERNS: Lazy<Vec<PeriodPattern>> = Lazy::new(|| {
    vec![
        // "2023W1"
        PeriodPattern {
            name: "iso_week",
            regex: Regex::new(r"(\d{4})W(\d{1,2})").expect("iso week pattern compiles"),
            order: FieldOrder::YearWeek,
        },
        // "Week 40 2025-09-29 - 2025-10-05"
        PeriodPattern {
            name: "week_date_range",
            regex: Regex::new(r"Week (\d+) (\d{4})-\d{2}-\d{2} - \d{4}-\d{2}-\d{2}")
                .expect("week range pattern compiles"),
            order: FieldOrder::WeekYear,
        },
    ]
});

/// How the parser picks one pattern for the whole upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternSelection {
    /// Stop at the first pattern that extracts at least one row
    FirstMatch,
    /// Try every pattern and keep the one with the most extractions;
    /// earlier patterns win ties
    #[default]
    BestOfAll,
}

impl fmt::Display for PatternSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => f.write_str("first-match"),
            Self::BestOfAll => f.write_str("best-of-all"),
        }
    }
}

impl FromStr for PatternSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first-match" | "first_match" => Ok(Self::FirstMatch),
            "best-of-all" | "best_of_all" => Ok(Self::BestOfAll),
            other => Err(format!("unknown pattern selection policy '{}'", other)),
        }
    }
}

/// Extraction count for one evaluated pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternAttempt {
    pub pattern: String,
    pub matched: usize,
    pub total: usize,
}

/// What the parser did, for run diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodParseReport {
    pub policy: PatternSelection,
    pub attempts: Vec<PatternAttempt>,
    pub selected_pattern: String,
    /// Rows removed because the selected pattern did not yield a valid period
    pub dropped_rows: usize,
}

/// The normalized table restricted to rows with a valid period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTable {
    pub normalized: NormalizedTable,
    /// Aligned with `normalized` rows
    pub periods: Vec<Period>,
    pub report: PeriodParseReport,
}

impl PeriodTable {
    /// Period of the first retained row; the run is assumed to cover one week
    pub fn reporting_period(&self) -> Option<Period> {
        self.periods.first().copied()
    }

    /// Rows whose week differs from the reporting week
    pub fn mixed_week_rows(&self) -> usize {
        match self.reporting_period() {
            Some(first) => self.periods.iter().filter(|p| p.week != first.week).count(),
            None => 0,
        }
    }
}

/// Coerce extracted text to a period; `None` when either field is not a
/// number or the week is outside 1..=53
pub fn coerce_period(year: &str, week: &str) -> Option<Period> {
    let year = year.trim().parse::<i32>().ok()?;
    let week = week.trim().parse::<u32>().ok()?;
    if (1..=53).contains(&week) {
        Some(Period { year, week })
    } else {
        None
    }
}

/// Parse a single label with the first pattern that yields a valid period
pub fn parse_label(label: &str, patterns: &[PeriodPattern]) -> Option<Period> {
    let label = label.trim();
    patterns
        .iter()
        .filter_map(|p| p.extract(label))
        .find_map(|(year, week)| coerce_period(year, week))
}

/// Period parser over the normalized upload's period label column
pub struct PeriodParser<'p> {
    pub patterns: &'p [PeriodPattern],
    pub column: String,
    pub policy: PatternSelection,
}

impl PeriodParser<'static> {
    pub fn new(policy: PatternSelection) -> Self {
        Self {
            patterns: &DEFAULT_PATTERNS,
            column: PERIOD_COLUMN.to_string(),
            policy,
        }
    }
}

impl<'p> PeriodParser<'p> {
    pub fn with_patterns(patterns: &'p [PeriodPattern], column: &str, policy: PatternSelection) -> Self {
        Self {
            patterns,
            column: column.to_string(),
            policy,
        }
    }

    /// Extract (year, week) per row, keep rows that coerce, and return the
    /// reporting week taken from the first retained row
    pub fn parse(&self, mut normalized: NormalizedTable) -> Result<(PeriodTable, u32)> {
        let column = normalized.table.column_index(&self.column).ok_or_else(|| {
            AlertError::NoPeriodMatch(NoPeriodMatchReason::MissingColumn(self.column.clone()))
        })?;

        let labels: Vec<Option<String>> = (0..normalized.len())
            .map(|row| normalized.table.cell(row, column).map(|l| l.trim().to_string()))
            .collect();
        let total = labels.len();

        let mut attempts = Vec::new();
        let mut best: Option<(usize, Vec<Option<(&str, &str)>>)> = None;
        let mut best_success = 0;

        for (i, pattern) in self.patterns.iter().enumerate() {
            let extracted: Vec<Option<(&str, &str)>> = labels
                .iter()
                .map(|label| label.as_deref().and_then(|l| pattern.extract(l)))
                .collect();
            let matched = extracted.iter().filter(|e| e.is_some()).count();
            attempts.push(PatternAttempt {
                pattern: pattern.name.to_string(),
                matched,
                total,
            });

            if matched > best_success {
                best_success = matched;
                best = Some((i, extracted));
            }
            if self.policy == PatternSelection::FirstMatch && best.is_some() {
                break;
            }
        }

        let (selected, extracted) =
            best.ok_or(AlertError::NoPeriodMatch(NoPeriodMatchReason::NoPatternMatched))?;

        let coerced: Vec<Option<Period>> = extracted
            .iter()
            .map(|e| e.and_then(|(year, week)| coerce_period(year, week)))
            .collect();
        let keep: Vec<bool> = coerced.iter().map(Option::is_some).collect();
        let periods: Vec<Period> = coerced.into_iter().flatten().collect();
        if periods.is_empty() {
            return Err(AlertError::NoPeriodMatch(NoPeriodMatchReason::AllRowsDropped));
        }

        let report = PeriodParseReport {
            policy: self.policy,
            attempts,
            selected_pattern: self.patterns[selected].name.to_string(),
            dropped_rows: total - periods.len(),
        };
        let reporting_week = periods[0].week;

        normalized.retain_rows(&keep);
        Ok((
            PeriodTable {
                normalized,
                periods,
                report,
            },
            reporting_week,
        ))
    }
}

/// Parse the default period column with the default patterns
pub fn parse_period(normalized: NormalizedTable, policy: PatternSelection) -> Result<(PeriodTable, u32)> {
    PeriodParser::new(policy).parse(normalized)
}
