//! # Equipscope Entry Point
//!
//! Parses the CLI and drives the async command handlers on a Tokio
//! runtime:
//!
//! ```bash
//! equipscope ingest --owner alice --file plant.csv
//! equipscope list --owner alice
//! equipscope report --owner alice <dataset-id>
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in the CLI binary

mod cli;

use clap::Parser as _;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    equipscope::logging::init()?;

    let cli = cli::Cli::parse();

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(cli.command))?;
    Ok(())
}
