use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::{Alert, DiseaseSet};

/// When the non-priority cap is applied relative to ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruncationOrder {
    /// Keep the first N non-priority alerts in the order they arrived, then rank
    #[default]
    ArrivalOrder,
    /// Rank non-priority alerts by deviation first, then keep the top N
    Ranked,
}

impl fmt::Display for TruncationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArrivalOrder => f.write_str("arrival-order"),
            Self::Ranked => f.write_str("ranked"),
        }
    }
}

impl FromStr for TruncationOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arrival-order" | "arrival_order" => Ok(Self::ArrivalOrder),
            "ranked" => Ok(Self::Ranked),
            other => Err(format!("unknown truncation order '{}'", other)),
        }
    }
}

/// User-adjustable controls for non-priority alerts
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub priority: DiseaseSet,
    pub max_non_priority: usize,
    pub min_deviation: f64,
    pub truncation: TruncationOrder,
}

/// Final ranked alerts and how many came from each partition
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSelection {
    pub ranked: Vec<Alert>,
    pub priority_count: usize,
    pub non_priority_count: usize,
}

impl AlertSelection {
    pub fn total(&self) -> usize {
        self.ranked.len()
    }
}

fn by_deviation_desc(a: &Alert, b: &Alert) -> Ordering {
    b.deviation.partial_cmp(&a.deviation).unwrap_or(Ordering::Equal)
}

/// Partition candidates into priority and non-priority, cap the latter, and
/// rank the union by deviation (stable: equal deviations keep arrival order).
///
/// Priority alerts are never filtered or truncated.
pub fn select_alerts(candidates: Vec<Alert>, config: &SelectionConfig) -> AlertSelection {
    let (priority, mut non_priority): (Vec<Alert>, Vec<Alert>) = candidates
        .into_iter()
        .partition(|a| config.priority.contains(&a.disease));

    non_priority.retain(|a| a.deviation >= config.min_deviation);
    if config.truncation == TruncationOrder::Ranked {
        non_priority.sort_by(by_deviation_desc);
    }
    non_priority.truncate(config.max_non_priority);

    let priority_count = priority.len();
    let non_priority_count = non_priority.len();

    let mut ranked = priority;
    ranked.extend(non_priority);
    ranked.sort_by(by_deviation_desc);

    AlertSelection {
        ranked,
        priority_count,
        non_priority_count,
    }
}
