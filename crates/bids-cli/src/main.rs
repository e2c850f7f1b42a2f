//! DICOM-to-BIDS batch converter CLI.

use anyhow::{Context, Result};
use bids_cli::config::BatchConfig;
use clap::Parser;

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::{run_convert, run_mapping, run_physio};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let config = BatchConfig::load_optional(cli.config.as_deref()).context("load configuration")?;
    match &cli.command {
        Command::Convert(args) => run_convert(cli, args, &config),
        Command::Physio(args) => run_physio(cli, args, &config),
        Command::Mapping(args) => run_mapping(args, &config),
    }
}
