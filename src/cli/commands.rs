use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::config::{ConfigOverrides, ImporterConfig};
use crate::error::Result;
use crate::logging;
use crate::models::ProcessedFile;
use crate::processors::Importer;
use crate::store::{StationSummary, StoreStats, WeatherStore};
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct StatusReport {
    database: PathBuf,
    stats: StoreStats,
    stations: Vec<StationSummary>,
    processed_files: Vec<ProcessedFile>,
}

pub fn run(cli: Cli) -> Result<()> {
    let overrides = overrides_for(&cli);
    let config = ImporterConfig::load_with_overrides(cli.config.as_deref(), overrides)?;

    logging::init(&config.log_file, cli.verbose)?;

    match cli.command {
        Commands::Import { json, .. } => {
            info!(
                "Importing {} files from {} into {}",
                config.extension,
                config.data_dir.display(),
                config.database_path.display()
            );

            let mut store = WeatherStore::open(&config.database_path)?;
            let importer = Importer::from_config(&config);

            let progress = ProgressReporter::new(0, "Importing observation files...", cli.quiet);
            let report = importer.run(&mut store, Some(&progress))?;
            drop(progress);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n{}", report.summary());
            }
        }

        Commands::Check { .. } => {
            info!(
                "Checking {} files in {} against {}",
                config.extension,
                config.data_dir.display(),
                config.database_path.display()
            );

            let store = open_for_check(&config.database_path)?;
            let importer = Importer::from_config(&config);
            let report = importer.check(&store)?;

            println!("\n{}", report.summary());

            if report.total_skipped_lines() == 0 {
                println!("✅ All lines parsed cleanly");
            } else {
                println!(
                    "⚠️  Found {} malformed lines",
                    report.total_skipped_lines()
                );
            }
        }

        Commands::Status { json, .. } => {
            let store = WeatherStore::open_existing(&config.database_path)?;
            let status = StatusReport {
                database: config.database_path.clone(),
                stats: store.stats()?,
                stations: store.station_summaries()?,
                processed_files: store.processed_files()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

/// A dry run never creates the database; without one every line counts as new
fn open_for_check(database_path: &Path) -> Result<WeatherStore> {
    if database_path.is_file() {
        WeatherStore::open_existing(database_path)
    } else {
        WeatherStore::open_in_memory()
    }
}

fn overrides_for(cli: &Cli) -> ConfigOverrides {
    let mut overrides = match &cli.command {
        Commands::Import { source, .. } | Commands::Check { source } => source_overrides(source),
        Commands::Status { database, .. } => ConfigOverrides {
            database_path: database.clone(),
            ..Default::default()
        },
    };
    overrides.log_file = cli.log_file.clone();
    overrides
}

fn source_overrides(source: &SourceArgs) -> ConfigOverrides {
    ConfigOverrides {
        data_dir: source.data_dir.clone(),
        database_path: source.database.clone(),
        log_file: None,
        extension: source.extension.clone(),
    }
}

fn print_status(status: &StatusReport) {
    println!("Database: {}", status.database.display());
    println!(
        "Stations: {}, Observations: {}, Processed files: {}",
        status.stats.stations, status.stats.observations, status.stats.processed_files
    );

    if !status.stations.is_empty() {
        println!("\nStations:");
        for summary in &status.stations {
            let range = match (summary.first_date, summary.last_date) {
                (Some(first), Some(last)) => format!("{}..{}", first, last),
                _ => "no data".to_string(),
            };
            println!(
                "  {:>4}. {} ({}): {} observations, {}",
                summary.station.id,
                summary.station.name,
                summary.station.state,
                summary.observations,
                range
            );
        }
    }

    if !status.processed_files.is_empty() {
        println!("\nProcessed Files:");
        for file in &status.processed_files {
            println!(
                "  {} at {}",
                file.filename,
                file.processed_at.as_deref().unwrap_or("unknown")
            );
        }
    }
}
