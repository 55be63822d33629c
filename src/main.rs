use clap::Parser;
use weather_loader::cli::{run, Cli};
use weather_loader::error::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
