//! `sightline` binary entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use sightline_cli::cli::Cli;
use sightline_cli::{commands, logging};

fn main() -> ExitCode {
    let _log_guard = logging::init();
    let cli = Cli::parse();

    match commands::execute(cli, io::stdin().lock(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
