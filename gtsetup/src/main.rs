// gtsetup/src/main.rs
use std::process;

use clap::Parser;
use colored::Colorize;
use gtsetup_common::config::Config;
use gtsetup_common::error::{Result as SetupResult, SetupError};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::provision::ProvisionArgs;
use cli::{CliArgs, Command};

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("GTSETUP_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

#[tokio::main]
async fn main() -> SetupResult<()> {
    let cli_args = CliArgs::parse();
    init_logging(cli_args.verbose);

    let config = Config::load().map_err(|e| match e {
        SetupError::Config(msg) => SetupError::Config(format!("Could not load config: {msg}")),
        other => other,
    });
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };

    let command = cli_args
        .command
        .unwrap_or_else(|| Command::Provision(ProvisionArgs::default()));

    if let Err(e) = command.run(&config).await {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }

    debug!("Command completed successfully.");
    Ok(())
}
