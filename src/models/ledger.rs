use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::utils::constants::LEDGER_TIMESTAMP_FORMAT;

/// Ledger entry marking a data file as fully imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub filename: String,
    pub processed_at: Option<String>,
}

impl ProcessedFile {
    pub fn new(filename: impl Into<String>, processed_at: Option<String>) -> Self {
        Self {
            filename: filename.into(),
            processed_at,
        }
    }
}

/// Current UTC time in the ledger's ISO-8601 format
pub fn ledger_timestamp() -> String {
    Utc::now().format(LEDGER_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_ledger_timestamp_format() {
        let ts = ledger_timestamp();
        assert!(NaiveDateTime::parse_from_str(&ts, LEDGER_TIMESTAMP_FORMAT).is_ok());
        assert_eq!(ts.len(), "2024-01-01T00:00:00.000000".len());
    }
}
