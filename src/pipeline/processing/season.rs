use crate::types::{DiseaseSet, LongObservation, Season};

/// Season for an epidemiological week. Missing weeks map to `Unknown`.
pub fn classify_season(week: Option<u32>) -> Season {
    match week {
        None => Season::Unknown,
        Some(10..=20) => Season::Spring,
        Some(21..=35) => Season::Summer,
        Some(36..=43) => Season::Autumn,
        Some(_) => Season::Winter,
    }
}

/// Force the year-round season onto every observation of a listed disease
pub fn apply_year_round_override(mut long: Vec<LongObservation>, year_round: &DiseaseSet) -> Vec<LongObservation> {
    for obs in long.iter_mut().filter(|o| year_round.contains(&o.disease)) {
        obs.season = Season::YearRound;
    }
    long
}

/// Number of listed year-round diseases that actually occur in the table
pub fn overridden_disease_count(long: &[LongObservation], year_round: &DiseaseSet) -> usize {
    year_round
        .iter()
        .filter(|d| long.iter().any(|o| o.disease == *d))
        .count()
}
