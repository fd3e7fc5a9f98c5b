use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use outbreak_alerts::app::{DetectAlertsUseCase, ImportThresholdsUseCase};
use outbreak_alerts::app::ports::ThresholdSourcePort;
use outbreak_alerts::config::Config;
use outbreak_alerts::constants::PROVINCES;
use outbreak_alerts::infra::{
    CsvAlertOutputAdapter, FileThresholdSource, FileUploadSource, JsonReportOutputAdapter, StoreThresholdSource,
};
use outbreak_alerts::pipeline::processing::parser::{parse_label, PatternSelection, DEFAULT_PATTERNS};
use outbreak_alerts::pipeline::processing::selection::TruncationOrder;
use outbreak_alerts::pipeline::storage::{resolve_province, FsThresholdStore, ThresholdStore};
use outbreak_alerts::{classify_season, logging, observability, AlertPipeline, DiseaseSet};

#[derive(Parser)]
#[command(name = "outbreak_alerts")]
#[command(about = "Seasonal-threshold outbreak alerts for weekly surveillance exports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (default: $OUTBREAK_ALERTS_CONFIG, then ./outbreak_alerts.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect alerts in a weekly upload
    Run {
        /// Province whose thresholds apply
        #[arg(long)]
        province: String,
        /// Weekly surveillance export (CSV)
        #[arg(long)]
        upload: PathBuf,
        /// Threshold CSV to use instead of the stored province table
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Directory for the alert CSV
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Priority disease to keep (repeatable; default: all configured)
        #[arg(long = "priority")]
        priority: Vec<String>,
        /// Maximum number of non-priority alerts
        #[arg(long)]
        top_n: Option<usize>,
        /// Minimum deviation for non-priority alerts
        #[arg(long)]
        min_deviation: Option<f64>,
        /// Period pattern policy: best-of-all or first-match
        #[arg(long)]
        pattern_policy: Option<PatternSelection>,
        /// Non-priority truncation: arrival-order or ranked
        #[arg(long)]
        truncation: Option<TruncationOrder>,
        /// Write a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
        /// Write a Prometheus metrics snapshot here
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Validate a threshold CSV and store it as the province's current table
    ImportThresholds {
        #[arg(long)]
        province: String,
        /// Threshold CSV to import
        #[arg(long)]
        file: PathBuf,
        /// Threshold store directory (default from config)
        #[arg(long)]
        thresholds_dir: Option<PathBuf>,
    },
    /// Show how a period label is parsed
    ParsePeriod {
        label: String,
    },
    /// List provinces and whether thresholds are stored for them
    Provinces {
        #[arg(long)]
        thresholds_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    logging::init_logging(&config.paths.log_dir);

    match cli.command {
        Commands::Run {
            province,
            upload,
            thresholds,
            output_dir,
            priority,
            top_n,
            min_deviation,
            pattern_policy,
            truncation,
            report,
            metrics_out,
        } => {
            if metrics_out.is_some() {
                observability::init()?;
            }

            let province = resolve_province(&province)?;
            let mut settings = config.pipeline_settings();
            if !priority.is_empty() {
                settings.selection.priority = priority_subset(&settings.selection.priority, &priority)?;
            }
            if let Some(n) = top_n {
                settings.selection.max_non_priority = n;
            }
            if let Some(min) = min_deviation {
                if !min.is_finite() || min < 0.0 {
                    bail!("--min-deviation must be a non-negative number");
                }
                settings.selection.min_deviation = min;
            }
            if let Some(policy) = pattern_policy {
                settings.pattern_selection = policy;
            }
            if let Some(order) = truncation {
                settings.selection.truncation = order;
            }

            let threshold_source: Box<dyn ThresholdSourcePort> = match thresholds {
                Some(path) => Box::new(FileThresholdSource::new(path)),
                None => Box::new(StoreThresholdSource::new(FsThresholdStore::new(
                    config.paths.thresholds_dir.clone(),
                ))),
            };
            let output_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());

            let mut use_case = DetectAlertsUseCase::new(
                AlertPipeline::new(settings),
                threshold_source,
                Box::new(CsvAlertOutputAdapter::new(output_dir)),
            );
            if let Some(path) = report {
                use_case = use_case.with_report_output(Box::new(JsonReportOutputAdapter::new(path)));
            }

            let outcome = use_case.execute(province, &FileUploadSource::new(upload));

            if let Some(path) = &metrics_out {
                write_metrics_snapshot(path)?;
            }

            let outcome = outcome?;
            println!("{}", outcome.summary_line());
            println!("Alerts written to {}", outcome.alert_location);
        }
        Commands::ImportThresholds {
            province,
            file,
            thresholds_dir,
        } => {
            let dir = thresholds_dir.unwrap_or_else(|| config.paths.thresholds_dir.clone());
            let use_case = ImportThresholdsUseCase::new(FsThresholdStore::new(dir));
            let outcome = use_case.import_file(&province, &file)?;
            println!(
                "Imported {} threshold rows for {} into {}",
                outcome.records, outcome.province, outcome.location
            );
        }
        Commands::ParsePeriod { label } => match parse_label(&label, &DEFAULT_PATTERNS) {
            Some(period) => println!(
                "year {} week {} season {}",
                period.year,
                period.week,
                classify_season(Some(period.week))
            ),
            None => bail!("No period pattern matched '{}'", label),
        },
        Commands::Provinces { thresholds_dir } => {
            let dir = thresholds_dir.unwrap_or_else(|| config.paths.thresholds_dir.clone());
            let store = FsThresholdStore::new(dir);
            for province in PROVINCES {
                let status = if store.contains(province) { "thresholds stored" } else { "no thresholds" };
                println!("{:<20} {}", province, status);
            }
        }
    }

    Ok(())
}

/// Restrict the configured priority list to the names the user picked
fn priority_subset(configured: &DiseaseSet, picked: &[String]) -> Result<DiseaseSet> {
    let unknown: Vec<&str> = picked
        .iter()
        .map(String::as_str)
        .filter(|d| !configured.contains(d))
        .collect();
    if !unknown.is_empty() {
        let mut known: Vec<&str> = configured.iter().collect();
        known.sort_unstable();
        bail!(
            "Not a configured priority disease: {}. Choose from: {}",
            unknown.join(", "),
            known.join(", ")
        );
    }
    Ok(DiseaseSet::new(picked.iter().cloned()))
}

fn write_metrics_snapshot(path: &Path) -> Result<()> {
    match observability::render() {
        Some(snapshot) => {
            std::fs::write(path, snapshot)
                .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
            info!("Metrics snapshot written to {}", path.display());
        }
        None => warn!("Metrics recorder not installed; nothing written to {}", path.display()),
    }
    Ok(())
}
