use crate::config::ImporterConfig;
use crate::error::{ImportError, Result};
use crate::models::{ledger_timestamp, StationKey};
use crate::processors::report::{FileReport, ImportReport};
use crate::readers::{resolve_station, LineOutcome, ObservationReader, SkippedLine};
use crate::store::{InsertOutcome, WeatherStore};
use crate::utils::constants::DEFAULT_EXTENSION;
use crate::utils::progress::ProgressReporter;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Candidate files split by ledger membership
#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    pub pending: Vec<PathBuf>,
    pub already_processed: Vec<PathBuf>,
}

impl DiscoveredFiles {
    pub fn total(&self) -> usize {
        self.pending.len() + self.already_processed.len()
    }
}

/// Sequential, idempotent loader of observation files into a [`WeatherStore`].
///
/// Each new file is imported in its own transaction together with its ledger
/// entry, so a file is either fully recorded or not recorded at all. Files already
/// in the ledger are never opened again.
pub struct Importer {
    data_dir: PathBuf,
    extension: String,
    reader: ObservationReader,
}

impl Importer {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            reader: ObservationReader::new(),
        }
    }

    pub fn from_config(config: &ImporterConfig) -> Self {
        Self::new(config.data_dir.clone()).with_extension(&config.extension)
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// List files in the data directory with the configured extension, sorted by name
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.data_dir.is_dir() {
            return Err(ImportError::InvalidPath(format!(
                "Data directory does not exist: {}",
                self.data_dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();

            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            files.push(path);
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Split discovered files into those still to import and those in the ledger
    pub fn pending_files(&self, store: &WeatherStore) -> Result<DiscoveredFiles> {
        let processed = store.processed_filenames()?;
        let mut discovered = DiscoveredFiles::default();

        for path in self.discover_files()? {
            if processed.contains(file_name(&path)?) {
                debug!("Skipping already processed file {}", path.display());
                discovered.already_processed.push(path);
            } else {
                discovered.pending.push(path);
            }
        }

        Ok(discovered)
    }

    /// Import every file not yet in the ledger
    pub fn run(
        &self,
        store: &mut WeatherStore,
        progress: Option<&ProgressReporter>,
    ) -> Result<ImportReport> {
        let discovered = self.pending_files(store)?;
        info!("Found {} new file(s).", discovered.pending.len());

        if let Some(p) = progress {
            p.set_length(discovered.pending.len() as u64);
        }

        let mut report = ImportReport {
            files_discovered: discovered.total(),
            files_already_processed: discovered.already_processed.len(),
            files: Vec::with_capacity(discovered.pending.len()),
        };

        for path in &discovered.pending {
            if let Some(p) = progress {
                p.set_message(&format!("Importing {}", path.display()));
            }

            let file_report = self.import_file(store, path)?;
            report.files.push(file_report);

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        if let Some(p) = progress {
            p.finish_with_message(&format!("Imported {} file(s)", report.files_processed()));
        }

        info!("ETL job complete. Total inserted: {}", report.total_inserted());
        Ok(report)
    }

    /// Import one file: resolve its station, insert new observations, record it in the
    /// ledger and commit, all in a single transaction
    pub fn import_file(&self, store: &mut WeatherStore, path: &Path) -> Result<FileReport> {
        let filename = file_name(path)?;
        let station = resolve_station(filename)?;
        let lines = self.reader.stream(path)?;

        let tx = store.begin_file()?;
        let station_id = tx.get_or_create_station(&station)?;

        let mut report = FileReport::new(filename, station);
        report.station_id = Some(station_id);

        for outcome in lines {
            match outcome.map_err(|e| e.in_file(filename))? {
                LineOutcome::Blank => continue,
                LineOutcome::Skipped(skipped) => {
                    report.lines_read += 1;
                    log_skipped(filename, &skipped);
                    report.skipped_lines.push(skipped);
                }
                LineOutcome::Parsed { observation, .. } => {
                    report.lines_read += 1;
                    match tx.insert_observation(station_id, &observation)? {
                        InsertOutcome::Inserted => report.inserted += 1,
                        InsertOutcome::Duplicate => report.duplicates += 1,
                    }
                }
            }
        }

        tx.mark_processed(filename, &ledger_timestamp())?;
        tx.commit()?;

        info!("{}: Inserted {} new records.", filename, report.inserted);
        if report.duplicates > 0 {
            debug!(
                "{}: {} records already present",
                filename, report.duplicates
            );
        }

        Ok(report)
    }

    /// Dry run: parse every pending file and report what an import would do, without writing
    pub fn check(&self, store: &WeatherStore) -> Result<ImportReport> {
        let discovered = self.pending_files(store)?;
        info!("Checking {} new file(s).", discovered.pending.len());

        let mut report = ImportReport {
            files_discovered: discovered.total(),
            files_already_processed: discovered.already_processed.len(),
            files: Vec::with_capacity(discovered.pending.len()),
        };

        // Dates already counted as new, across every file of the run
        let mut seen = HashSet::new();
        for path in &discovered.pending {
            report.files.push(self.check_file(store, path, &mut seen)?);
        }

        info!(
            "Check complete. Would insert: {}, malformed lines: {}",
            report.total_inserted(),
            report.total_skipped_lines()
        );
        Ok(report)
    }

    fn check_file(
        &self,
        store: &WeatherStore,
        path: &Path,
        seen: &mut HashSet<(StationKey, u32)>,
    ) -> Result<FileReport> {
        let filename = file_name(path)?;
        let station = resolve_station(filename)?;
        let station_id = store.find_station(&station)?.map(|s| s.id);

        let mut report = FileReport::new(filename, station);
        report.station_id = station_id;

        for outcome in self.reader.stream(path)? {
            match outcome.map_err(|e| e.in_file(filename))? {
                LineOutcome::Blank => continue,
                LineOutcome::Skipped(skipped) => {
                    report.lines_read += 1;
                    log_skipped(filename, &skipped);
                    report.skipped_lines.push(skipped);
                }
                LineOutcome::Parsed { observation, .. } => {
                    report.lines_read += 1;
                    let stored = match station_id {
                        Some(id) => store.observation(id, observation.date)?.is_some(),
                        None => false,
                    };
                    if stored || !seen.insert((report.station.clone(), observation.date)) {
                        report.duplicates += 1;
                    } else {
                        report.inserted += 1;
                    }
                }
            }
        }

        info!(
            "{}: {} new records, {} duplicates, {} malformed lines.",
            filename,
            report.inserted,
            report.duplicates,
            report.skipped_lines.len()
        );
        Ok(report)
    }
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| ImportError::InvalidPath(path.display().to_string()))
}

fn log_skipped(filename: &str, skipped: &SkippedLine) {
    warn!(
        "{} line {}: skipped, {}",
        filename, skipped.line, skipped.reason
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, StationKey};
    use crate::readers::SkipReason;
    use crate::store::StoreStats;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_discover_files_filters_and_sorts() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(dir.path(), "Texas_Austin.txt", "");
        write_file(dir.path(), "Iowa_Ames.txt", "");
        write_file(dir.path(), "notes.md", "");
        fs::create_dir(dir.path().join("Ohio_Dayton.txt"))?;

        let importer = Importer::new(dir.path());
        let names: Vec<String> = importer
            .discover_files()?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["Iowa_Ames.txt", "Texas_Austin.txt"]);
        Ok(())
    }

    #[test]
    fn test_with_extension() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(dir.path(), "Texas_Austin.txt", "");
        write_file(dir.path(), "Texas_Waco.dat", "");

        let importer = Importer::new(dir.path()).with_extension(".dat");
        let files = importer.discover_files()?;

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("Texas_Waco.dat"));
        Ok(())
    }

    #[test]
    fn test_missing_data_dir() {
        let importer = Importer::new("/definitely/not/here");
        assert!(matches!(
            importer.discover_files(),
            Err(ImportError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_import_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_file(
            dir.path(),
            "Texas_Austin.txt",
            "19900101\t250\t-9999\t5\n19900102\t260\t100\n19900101\t1\t1\t1\n",
        );

        let mut store = WeatherStore::open_in_memory()?;
        let importer = Importer::new(dir.path());
        let report = importer.import_file(&mut store, &path)?;

        assert_eq!(report.station, StationKey::new("AUSTIN", "Texas"));
        assert_eq!(report.lines_read, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(
            report.skipped_lines,
            vec![SkippedLine {
                line: 2,
                reason: SkipReason::FieldCount { found: 3 },
            }]
        );

        let station_id = report.station_id.unwrap();
        assert_eq!(
            store.observation(station_id, 19900101)?,
            Some(Observation::new(19900101, Some(25.0), None, Some(0.5)))
        );
        assert!(store.is_processed("Texas_Austin.txt")?);
        Ok(())
    }

    #[test]
    fn test_malformed_filename_aborts_before_station_work() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_file(dir.path(), "Austin.txt", "19900101\t250\t-9999\t5\n");

        let mut store = WeatherStore::open_in_memory()?;
        let result = Importer::new(dir.path()).import_file(&mut store, &path);

        assert!(matches!(result, Err(ImportError::MalformedFilename { .. })));
        assert_eq!(store.stats()?.stations, 0);
        Ok(())
    }

    #[test]
    fn test_malformed_number_rolls_back_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_file(
            dir.path(),
            "Texas_Austin.txt",
            "19900101\t250\t-9999\t5\n19900102\tbad\t1\t1\n",
        );

        let mut store = WeatherStore::open_in_memory()?;
        let err = Importer::new(dir.path())
            .import_file(&mut store, &path)
            .unwrap_err();

        match err {
            ImportError::MalformedNumericField { file, line, .. } => {
                assert_eq!(file, "Texas_Austin.txt");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        let stats = store.stats()?;
        assert_eq!(stats.observations, 0);
        assert_eq!(stats.stations, 0);
        assert_eq!(stats.processed_files, 0);
        Ok(())
    }

    #[test]
    fn test_check_does_not_write() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(
            dir.path(),
            "Texas_Austin.txt",
            "19900101\t250\t-9999\t5\n19900101\t250\t-9999\t5\n19900102\t1\n",
        );

        let store = WeatherStore::open_in_memory()?;
        let report = Importer::new(dir.path()).check(&store)?;

        assert_eq!(report.files_processed(), 1);
        assert_eq!(report.total_inserted(), 1);
        assert_eq!(report.total_duplicates(), 1);
        assert_eq!(report.total_skipped_lines(), 1);
        assert_eq!(report.files[0].station_id, None);
        assert_eq!(store.stats()?, StoreStats::default());
        Ok(())
    }
}
