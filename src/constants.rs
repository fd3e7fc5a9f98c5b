/// Fixed names shared across the pipeline and the CLI.
/// Column names follow the surveillance export and threshold file headers verbatim.

// Provinces with their own seasonal threshold tables
pub const PROVINCES: &[&str] = &["AJK", "Balochistan", "Gilgit Baltistan", "Islamabad", "Sindh"];

// Export metadata columns that carry no epidemiological signal
pub const METADATA_COLUMNS: &[&str] = &[
    "periodid",
    "periodcode",
    "perioddescription",
    "organisationunitid",
    "organisationunitcode",
    "organisationunitdescription",
];

// Organizational hierarchy, in Facility_ID join order
pub const HIERARCHY_COLUMNS: [&str; 6] = [
    "orgunitlevel1",
    "orgunitlevel2",
    "orgunitlevel3",
    "orgunitlevel4",
    "orgunitlevel5",
    "organisationunitname",
];

pub const PERIOD_COLUMN: &str = "periodname";
pub const UNKNOWN: &str = "Unknown";

/// Cell texts read as missing values, compared exactly
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];
pub const FACILITY_ID_DELIMITER: &str = "_";
pub const DISEASE_COLUMN_TOKEN: &str = "(New Cases)";
pub const EXCLUDED_DISEASE_TOKEN: &str = "Other";

pub const DEFAULT_MAX_NON_PRIORITY: usize = 50;
pub const DEFAULT_MIN_DEVIATION: f64 = 1.0;

pub const PRIORITY_DISEASES: &[&str] = &[
    "Crimean Congo Hemorrhagic Fever (New Cases)",
    "Anthrax (New Cases)",
    "Botulism (New Cases)",
    "Diphtheria (Probable) (New Cases)",
    "Neonatal Tetanus (New Cases)",
    "Acute Flaccid Paralysis (New Cases)",
];

// Always matched against the "Year-Round" threshold bucket
pub const YEAR_ROUND_DISEASES: &[&str] = &[
    "Acute Flaccid Paralysis (New Cases)",
    "Botulism (New Cases)",
    "Gonorrhea (New Cases)",
    "HIV/AIDS (New Cases)",
    "Leprosy (New Cases)",
    "Nosocomial Infections (New Cases)",
    "Syphilis (New Cases)",
    "Visceral Leishmaniasis (New Cases)",
    "Neonatal Tetanus (New Cases)",
];

pub const THRESHOLD_COLUMNS: &[&str] = &[
    "Facility_ID",
    "Disease",
    "Season",
    "Mean",
    "SD",
    "Threshold_95",
    "Threshold_99",
];

pub const ALERT_COLUMNS: &[&str] = &[
    "Facility_ID",
    "Disease",
    "Season",
    "Cases",
    "Mean",
    "SD",
    "Threshold_95",
    "Threshold_99",
    "Alert_Level",
    "Deviation",
];

/// Convert a province display name to the slug used in file names
pub fn province_slug(province: &str) -> String {
    province.trim().to_lowercase().replace(' ', "_")
}

/// Threshold table file name for a province
pub fn threshold_file_name(province: &str) -> String {
    format!("seasonal_thresholds_{}.csv", province_slug(province))
}

/// Alert export file name for a province and reporting week
pub fn alert_file_name(province: &str, week: u32) -> String {
    format!("alerts_{}_week_{}.csv", province_slug(province), week)
}

/// Resolve a user-supplied province name to its canonical spelling
pub fn canonical_province(name: &str) -> Option<&'static str> {
    let slug = province_slug(name);
    PROVINCES.iter().copied().find(|p| province_slug(p) == slug)
}
