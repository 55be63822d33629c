/// Raw value meaning "measurement not available"
pub const MISSING_VALUE: i64 = -9999;

/// Raw measurements are stored in tenths of a unit
pub const VALUE_SCALE: f64 = 10.0;

/// Number of tab-separated fields in an observation line
pub const OBSERVATION_FIELD_COUNT: usize = 4;

/// Observation date bounds (YYYYMMDD, inclusive)
pub const MIN_OBSERVATION_DATE: u32 = 19850101;
pub const MAX_OBSERVATION_DATE: u32 = 20141231;

/// Configuration defaults
pub const DEFAULT_DATA_DIR: &str = "weather_data";
pub const DEFAULT_DATABASE_PATH: &str = "weather.db";
pub const DEFAULT_LOG_FILE: &str = "etl_log.txt";
pub const DEFAULT_EXTENSION: &str = "txt";
pub const DEFAULT_CONFIG_FILE: &str = "weather-loader.toml";
pub const ENV_PREFIX: &str = "WEATHER_LOADER";

/// Timestamp formats
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
