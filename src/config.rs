//! Layered configuration: built-in defaults, an optional TOML file,
//! `WEATHER_LOADER_*` environment variables, then command-line overrides.

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATABASE_PATH, DEFAULT_DATA_DIR, DEFAULT_EXTENSION,
    DEFAULT_LOG_FILE, ENV_PREFIX,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Directory scanned for observation files
    pub data_dir: PathBuf,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Append-only log file
    pub log_file: PathBuf,

    /// Extension of observation files, without the leading dot
    pub extension: String,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Values given on the command line; `None` leaves the layered value in place
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub extension: Option<String>,
}

impl ImporterConfig {
    /// Load defaults, then `config_file` (or `weather-loader.toml` if present), then the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let default_file = PathBuf::from(DEFAULT_CONFIG_FILE);
        let (file, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (default_file, false),
        };

        debug!(
            "Loading configuration from {} (required: {})",
            file.display(),
            required
        );

        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default(
                "database_path",
                defaults.database_path.to_string_lossy().into_owned(),
            )?
            .set_default("log_file", defaults.log_file.to_string_lossy().into_owned())?
            .set_default("extension", defaults.extension)?
            .add_source(File::from(file.as_path()).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.normalize();
        Ok(config)
    }

    /// Load layered configuration and apply command-line overrides
    pub fn load_with_overrides(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = Self::load(config_file)?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(database_path) = overrides.database_path {
            self.database_path = database_path;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        if let Some(extension) = overrides.extension {
            self.extension = extension;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.extension = self.extension.trim().trim_start_matches('.').to_string();
    }
}
