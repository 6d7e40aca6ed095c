mod cli;
mod execute;

use std::process::ExitCode;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use crate::cli::CLI;

fn main() -> ExitCode {
    let cli = CLI::parse();
    init_logging(cli.verbose);
    match execute::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
