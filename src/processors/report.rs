use crate::models::StationKey;
use crate::readers::SkippedLine;
use serde::{Deserialize, Serialize};

/// Outcome of importing (or checking) one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    pub station: StationKey,
    /// `None` when the file was only checked and the station does not exist yet
    pub station_id: Option<i64>,
    pub lines_read: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub skipped_lines: Vec<SkippedLine>,
}

impl FileReport {
    pub fn new(filename: impl Into<String>, station: StationKey) -> Self {
        Self {
            filename: filename.into(),
            station,
            station_id: None,
            lines_read: 0,
            inserted: 0,
            duplicates: 0,
            skipped_lines: Vec::new(),
        }
    }
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub files_discovered: usize,
    pub files_already_processed: usize,
    pub files: Vec<FileReport>,
}

impl ImportReport {
    pub fn files_processed(&self) -> usize {
        self.files.len()
    }

    pub fn total_inserted(&self) -> u64 {
        self.files.iter().map(|f| f.inserted).sum()
    }

    pub fn total_duplicates(&self) -> u64 {
        self.files.iter().map(|f| f.duplicates).sum()
    }

    pub fn total_skipped_lines(&self) -> usize {
        self.files.iter().map(|f| f.skipped_lines.len()).sum()
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Import Report ===\n");
        summary.push_str(&format!("Files Discovered: {}\n", self.files_discovered));
        summary.push_str(&format!(
            "Already Processed: {}\n",
            self.files_already_processed
        ));
        summary.push_str(&format!("New Files: {}\n", self.files_processed()));
        summary.push_str(&format!("Records Inserted: {}\n", self.total_inserted()));
        summary.push_str(&format!("Duplicates Skipped: {}\n", self.total_duplicates()));
        summary.push_str(&format!(
            "Malformed Lines Skipped: {}\n",
            self.total_skipped_lines()
        ));

        if !self.files.is_empty() {
            summary.push_str("\nPer File:\n");
            for file in &self.files {
                summary.push_str(&format!(
                    "  {} [{}]: {} inserted, {} duplicates, {} skipped of {} lines\n",
                    file.filename,
                    file.station,
                    file.inserted,
                    file.duplicates,
                    file.skipped_lines.len(),
                    file.lines_read
                ));
            }
        }

        let skipped: Vec<(&str, &SkippedLine)> = self
            .files
            .iter()
            .flat_map(|f| f.skipped_lines.iter().map(move |s| (f.filename.as_str(), s)))
            .collect();

        if !skipped.is_empty() {
            summary.push_str("\nFirst 10 Skipped Lines:\n");
            for (i, (filename, line)) in skipped.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {} line {}: {}\n",
                    i + 1,
                    filename,
                    line.line,
                    line.reason
                ));
            }
        }

        summary
    }
}
