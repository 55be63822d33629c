use crate::error::{ImportError, Result};
use crate::utils::constants::LOG_TIMESTAMP_FORMAT;
use chrono::Local;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `[YYYY-MM-DD HH:MM:SS]` in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", Local::now().format(LOG_TIMESTAMP_FORMAT))
    }
}

/// Send log events to the console and append them to `log_file`.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug` when verbose.
pub fn init(log_file: &Path, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("weather_loader={}", default_level)));

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(LocalTimestamp)
                .with_writer(std::io::stdout),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_timer(LocalTimestamp)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| ImportError::Logging(e.to_string()))?;

    debug!("Logging to {}", log_file.display());
    Ok(())
}
