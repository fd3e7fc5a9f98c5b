use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Seasonal bucket a reporting week falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    #[serde(rename = "Year-Round")]
    YearRound,
    Unknown,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::YearRound => "Year-Round",
            Season::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Spring" => Ok(Season::Spring),
            "Summer" => Ok(Season::Summer),
            "Autumn" => Ok(Season::Autumn),
            "Winter" => Ok(Season::Winter),
            "Year-Round" => Ok(Season::YearRound),
            "Unknown" => Ok(Season::Unknown),
            other => Err(format!("unknown season '{}'", other)),
        }
    }
}

/// Epidemiological reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// Always within 1..=53
    pub week: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Normal,
    Alert,
    #[serde(rename = "High Alert")]
    HighAlert,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertLevel::Normal => "Normal",
            AlertLevel::Alert => "Alert",
            AlertLevel::HighAlert => "High Alert",
        };
        f.write_str(label)
    }
}

/// One (facility, season, disease) case count from the reshaped upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongObservation {
    pub facility_id: String,
    pub season: Season,
    pub disease: String,
    pub cases: i64,
}

/// Pre-computed seasonal statistics for one facility and disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    #[serde(rename = "Facility_ID")]
    pub facility_id: String,
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Season")]
    pub season: Season,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
    #[serde(rename = "SD")]
    pub sd: Option<f64>,
    #[serde(rename = "Threshold_95")]
    pub threshold_95: Option<f64>,
    #[serde(rename = "Threshold_99")]
    pub threshold_99: Option<f64>,
}

/// An observation joined with its threshold record and classified.
/// Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "Facility_ID")]
    pub facility_id: String,
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Season")]
    pub season: Season,
    #[serde(rename = "Cases")]
    pub cases: i64,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
    #[serde(rename = "SD")]
    pub sd: Option<f64>,
    #[serde(rename = "Threshold_95")]
    pub threshold_95: Option<f64>,
    #[serde(rename = "Threshold_99")]
    pub threshold_99: Option<f64>,
    #[serde(rename = "Alert_Level")]
    pub alert_level: AlertLevel,
    #[serde(rename = "Deviation")]
    pub deviation: f64,
}

/// A set of disease column names (priority list, year-round list)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiseaseSet(HashSet<String>);

impl DiseaseSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, disease: &str) -> bool {
        self.0.contains(disease)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_round_trips_year_round_label() {
        assert_eq!("Year-Round".parse::<Season>().unwrap(), Season::YearRound);
        assert_eq!(Season::YearRound.to_string(), "Year-Round");
        assert!("Monsoon".parse::<Season>().is_err());
    }

    #[test]
    fn test_alert_level_serializes_with_space() {
        let json = serde_json::to_string(&AlertLevel::HighAlert).unwrap();
        assert_eq!(json, "\"High Alert\"");
    }
}
