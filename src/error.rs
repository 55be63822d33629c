use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Filename must be in State_StationName.ext format: '{filename}'")]
    MalformedFilename { filename: String },

    #[error("{file}, line {line}: {field} is not an integer: '{value}'")]
    MalformedNumericField {
        file: String,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

impl ImportError {
    /// Attach the source file name to a numeric field error raised while parsing a line.
    pub fn in_file(self, filename: &str) -> Self {
        match self {
            ImportError::MalformedNumericField {
                line, field, value, ..
            } => ImportError::MalformedNumericField {
                file: filename.to_string(),
                line,
                field,
                value,
            },
            other => other,
        }
    }
}
