use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weather-loader")]
#[command(about = "Idempotent loader for tab-delimited weather observation files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide the progress indicator")]
    pub quiet: bool,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file [default: weather-loader.toml if present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Log file path [default: etl_log.txt]")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import every observation file not yet recorded in the ledger
    Import {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long, help = "Print the import report as JSON")]
        json: bool,
    },

    /// Parse new files and report what an import would do, without writing
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show ledger and station contents of the database
    Status {
        #[arg(short, long, help = "SQLite database file [default: weather.db]")]
        database: Option<PathBuf>,

        #[arg(long, help = "Print status as JSON")]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short = 'i', long, help = "Directory containing observation files [default: weather_data]")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, help = "SQLite database file [default: weather.db]")]
    pub database: Option<PathBuf>,

    #[arg(short, long, help = "Observation file extension [default: txt]")]
    pub extension: Option<String>,
}
