use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use outbreak_alerts::app::{DetectAlertsUseCase, ImportThresholdsUseCase};
use outbreak_alerts::constants::ALERT_COLUMNS;
use outbreak_alerts::infra::{CsvAlertOutputAdapter, FileUploadSource, JsonReportOutputAdapter, StoreThresholdSource};
use outbreak_alerts::pipeline::processing::parser::PatternSelection;
use outbreak_alerts::pipeline::processing::reshape::{SeasonedTable, TokenMatcher};
use outbreak_alerts::pipeline::processing::selection::{SelectionConfig, TruncationOrder};
use outbreak_alerts::pipeline::storage::FsThresholdStore;
use outbreak_alerts::{
    apply_year_round_override, classify_season, match_and_classify, normalize, parse_period, reshape, select_alerts,
    AlertError, AlertLevel, AlertPipeline, DiseaseSet, PipelineSettings, RawTable, Season, ThresholdTable,
};

const FACILITIES: usize = 30;
const DISEASES: [&str; 4] = [
    "Measles (New Cases)",
    "Anthrax (New Cases)",
    "Leprosy (New Cases)",
    "Cholera (Other) (New Cases)",
];

fn facility_id(i: usize) -> String {
    format!("PK_Sindh_Karachi_East_Saddar_BHU {}", i)
}

fn upload_csv(period_label: &str) -> String {
    let mut csv = String::from(
        "periodid,orgunitlevel1,orgunitlevel2,orgunitlevel3,orgunitlevel4,orgunitlevel5,organisationunitname,periodname",
    );
    for disease in DISEASES {
        csv.push(',');
        csv.push_str(disease);
    }
    csv.push('\n');
    for i in 0..FACILITIES {
        csv.push_str(&format!(
            "x,PK,Sindh,Karachi,East,Saddar,BHU {},{},{},{},{},40\n",
            i,
            period_label,
            (i * 7) % 23,
            i % 4,
            i % 5
        ));
    }
    csv
}

fn thresholds_csv() -> String {
    let mut csv = String::from("Facility_ID,Disease,Season,Mean,SD,Threshold_95,Threshold_99\n");
    for i in 0..FACILITIES {
        let id = facility_id(i);
        csv.push_str(&format!("{},Measles (New Cases),Winter,2,1.5,5,12\n", id));
        csv.push_str(&format!("{},Measles (New Cases),Spring,4,2,9,14\n", id));
        csv.push_str(&format!("{},Anthrax (New Cases),Winter,0,0.3,0,1\n", id));
        csv.push_str(&format!("{},Leprosy (New Cases),Year-Round,0.5,0.5,1,2\n", id));
        csv.push_str(&format!("{},Cholera (Other) (New Cases),Winter,2,1,3,4\n", id));
    }
    csv
}

fn run_pipeline(period_label: &str, settings: PipelineSettings) -> Result<outbreak_alerts::PipelineResult> {
    let raw = RawTable::from_csv_reader(upload_csv(period_label).as_bytes())?;
    let thresholds = ThresholdTable::from_csv_reader(thresholds_csv().as_bytes())?;
    Ok(AlertPipeline::new(settings).run(raw, &thresholds)?)
}

fn write(dir: &Path, name: &str, content: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn test_end_to_end_with_stored_thresholds() -> Result<()> {
    let temp_dir = tempdir()?;
    let store_dir = temp_dir.path().join("thresholds");
    let output_dir = temp_dir.path().join("output");
    let threshold_file = write(temp_dir.path(), "sindh_thresholds.csv", &thresholds_csv())?;
    let upload_file = write(temp_dir.path(), "upload.csv", &upload_csv("2023W5"))?;
    let report_file = temp_dir.path().join("report.json");

    let import = ImportThresholdsUseCase::new(FsThresholdStore::new(&store_dir));
    let imported = import.import_file("sindh", &threshold_file)?;
    assert_eq!(imported.records, FACILITIES * 5);

    let use_case = DetectAlertsUseCase::new(
        AlertPipeline::default(),
        Box::new(StoreThresholdSource::new(FsThresholdStore::new(&store_dir))),
        Box::new(CsvAlertOutputAdapter::new(&output_dir)),
    )
    .with_report_output(Box::new(JsonReportOutputAdapter::new(&report_file)));

    let outcome = use_case.execute("Sindh", &FileUploadSource::new(&upload_file))?;

    assert_eq!(outcome.result.period.week, 5);
    assert_eq!(outcome.result.season, Season::Winter);
    assert!(outcome.alert_location.ends_with("alerts_sindh_week_5.csv"));

    // The written table matches the ranked selection row for row
    let mut reader = csv::Reader::from_path(&outcome.alert_location)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    assert_eq!(headers, ALERT_COLUMNS);
    let deviations: Vec<f64> = reader
        .records()
        .map(|r| r.map(|r| r[9].parse::<f64>().unwrap()))
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(deviations.len(), outcome.result.selection.total());
    assert!(deviations.windows(2).all(|w| w[0] >= w[1]));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_file)?)?;
    assert_eq!(report["province"], "Sindh");
    assert_eq!(report["total_alerts"], outcome.result.selection.total());
    assert_eq!(report["diagnostics"]["season"], "Winter");
    assert_eq!(report["upload_sha256"].as_str().map(str::len), Some(64));

    assert!(outcome.summary_line().starts_with("Total alerts for Sindh: "));
    Ok(())
}

#[test]
fn test_long_table_has_no_loss_or_duplication() -> Result<()> {
    let result = run_pipeline("2023W5", PipelineSettings::default())?;

    assert_eq!(result.diagnostics.upload_rows, FACILITIES);
    assert_eq!(result.diagnostics.disease_columns, DISEASES.len());
    assert_eq!(result.diagnostics.long_rows, FACILITIES * DISEASES.len());
    assert_eq!(result.diagnostics.facility_count, FACILITIES);
    Ok(())
}

#[test]
fn test_stage_functions_compose() -> Result<()> {
    let raw = RawTable::from_csv_reader(upload_csv("Week 15 2024-04-08 - 2024-04-14").as_bytes())?;
    let thresholds = ThresholdTable::from_csv_reader(thresholds_csv().as_bytes())?;

    let (normalized, facilities) = normalize(raw)?;
    assert_eq!(facilities, FACILITIES);

    let (periods, week) = parse_period(normalized, PatternSelection::BestOfAll)?;
    assert_eq!(week, 15);
    let season = classify_season(Some(week));
    assert_eq!(season, Season::Spring);

    let long = reshape(&SeasonedTable { table: periods, season }, &TokenMatcher::default())?;
    let year_round = DiseaseSet::new(["Leprosy (New Cases)"]);
    let observations = apply_year_round_override(long.observations, &year_round);
    assert!(observations
        .iter()
        .filter(|o| o.disease == "Leprosy (New Cases)")
        .all(|o| o.season == Season::YearRound));

    let candidates = match_and_classify(&observations, &thresholds, season);
    // Spring run: only Spring and Year-Round thresholds apply
    assert!(candidates
        .iter()
        .all(|a| a.season == Season::Spring || a.season == Season::YearRound));
    assert!(candidates.iter().all(|a| a.deviation >= 1.0));
    assert!(candidates.iter().all(|a| !a.disease.contains("Other")));

    let selection = select_alerts(
        candidates,
        &SelectionConfig {
            priority: DiseaseSet::new(["Anthrax (New Cases)"]),
            max_non_priority: 5,
            min_deviation: 1.0,
            truncation: TruncationOrder::Ranked,
        },
    );
    assert!(selection.non_priority_count <= 5);
    Ok(())
}

#[test]
fn test_candidate_and_classification_invariants() -> Result<()> {
    let raw = RawTable::from_csv_reader(upload_csv("2023W5").as_bytes())?;
    let thresholds = ThresholdTable::from_csv_reader(thresholds_csv().as_bytes())?;
    let (normalized, _) = normalize(raw)?;
    let (periods, week) = parse_period(normalized, PatternSelection::FirstMatch)?;
    let season = classify_season(Some(week));
    let long = reshape(&SeasonedTable { table: periods, season }, &TokenMatcher::default())?;

    let classified = outbreak_alerts::pipeline::processing::classify::join_and_classify(
        &long.observations,
        &thresholds,
        season,
    );
    for alert in &classified {
        match alert.alert_level {
            AlertLevel::Normal => assert_eq!(alert.deviation, 0.0),
            AlertLevel::HighAlert => {
                assert_eq!(alert.deviation, alert.cases as f64 - alert.threshold_99.unwrap())
            }
            AlertLevel::Alert => {
                assert!(alert.threshold_99.map_or(true, |t99| alert.cases as f64 <= t99));
                assert_eq!(alert.deviation, alert.cases as f64 - alert.threshold_95.unwrap());
            }
        }
    }

    // Cholera (Other) always exceeds its thresholds but is never a candidate
    assert!(classified
        .iter()
        .any(|a| a.disease == "Cholera (Other) (New Cases)" && a.alert_level == AlertLevel::HighAlert));
    let candidates = match_and_classify(&long.observations, &thresholds, season);
    assert!(candidates.iter().all(|a| a.disease != "Cholera (Other) (New Cases)"));
    Ok(())
}

#[test]
fn test_selection_caps_and_priority_preservation() -> Result<()> {
    let mut settings = PipelineSettings::default();
    settings.selection.max_non_priority = 3;
    settings.selection.min_deviation = 2.0;

    let result = run_pipeline("2023W5", settings)?;
    let priority = DiseaseSet::new(outbreak_alerts::constants::PRIORITY_DISEASES.iter().copied());

    let non_priority: Vec<_> = result
        .selection
        .ranked
        .iter()
        .filter(|a| !priority.contains(&a.disease))
        .collect();
    assert!(non_priority.len() <= 3);
    assert!(non_priority.iter().all(|a| a.deviation >= 2.0));

    // Every priority candidate survives, whatever its deviation
    let raw = RawTable::from_csv_reader(upload_csv("2023W5").as_bytes())?;
    let thresholds = ThresholdTable::from_csv_reader(thresholds_csv().as_bytes())?;
    let (normalized, _) = normalize(raw)?;
    let (periods, week) = parse_period(normalized, PatternSelection::BestOfAll)?;
    let long = reshape(
        &SeasonedTable {
            table: periods,
            season: classify_season(Some(week)),
        },
        &TokenMatcher::default(),
    )?;
    let observations = apply_year_round_override(
        long.observations,
        &DiseaseSet::new(outbreak_alerts::constants::YEAR_ROUND_DISEASES.iter().copied()),
    );
    let candidates = match_and_classify(&observations, &thresholds, Season::Winter);
    let priority_candidates = candidates.iter().filter(|a| priority.contains(&a.disease)).count();
    assert!(priority_candidates > 0);
    assert_eq!(result.selection.priority_count, priority_candidates);
    Ok(())
}

#[test]
fn test_ranking_is_sorted_and_repeatable() -> Result<()> {
    let first = run_pipeline("2023W5", PipelineSettings::default())?;
    let second = run_pipeline("2023W5", PipelineSettings::default())?;

    let deviations: Vec<f64> = first.selection.ranked.iter().map(|a| a.deviation).collect();
    assert!(deviations.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(first.selection.ranked, second.selection.ranked);
    Ok(())
}

#[test]
fn test_ranked_truncation_never_keeps_less_than_arrival_order() -> Result<()> {
    let mut arrival = PipelineSettings::default();
    arrival.selection.max_non_priority = 2;
    let mut ranked = arrival.clone();
    ranked.selection.truncation = TruncationOrder::Ranked;

    let arrival = run_pipeline("2023W5", arrival)?;
    let ranked = run_pipeline("2023W5", ranked)?;

    let top = |r: &outbreak_alerts::PipelineResult| {
        r.selection
            .ranked
            .iter()
            .map(|a| a.deviation)
            .fold(f64::MIN, f64::max)
    };
    assert_eq!(arrival.selection.non_priority_count, 2);
    assert_eq!(ranked.selection.non_priority_count, 2);
    assert!(top(&ranked) >= top(&arrival));
    Ok(())
}

#[test]
fn test_missing_hierarchy_column_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let output_dir = temp_dir.path().join("output");
    let upload = upload_csv("2023W5").replacen("orgunitlevel4,", "tehsil,", 1);
    let upload_file = write(temp_dir.path(), "upload.csv", &upload)?;
    let threshold_file = write(temp_dir.path(), "thresholds.csv", &thresholds_csv())?;

    let use_case = DetectAlertsUseCase::new(
        AlertPipeline::default(),
        Box::new(outbreak_alerts::infra::FileThresholdSource::new(&threshold_file)),
        Box::new(CsvAlertOutputAdapter::new(&output_dir)),
    );

    let err = use_case
        .execute("Sindh", &FileUploadSource::new(&upload_file))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AlertError>(),
        Some(AlertError::Schema { missing }) if missing == &vec!["orgunitlevel4".to_string()]
    ));
    assert!(!output_dir.exists());
    Ok(())
}

#[test]
fn test_unparseable_periods_are_fatal() -> Result<()> {
    let err = run_pipeline("last week", PipelineSettings::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AlertError>(),
        Some(AlertError::NoPeriodMatch(_))
    ));
    Ok(())
}
