//! ResultStore Updater CLI entry point.

use anyhow::Result;
use clap::Parser;

use resultstore_updater::cli::commands::{resume_point, search, sync};
use resultstore_updater::cli::{handle_error, Cli, Commands};
use resultstore_updater::infrastructure::logging::LoggerImpl;
use resultstore_updater::{Config, ConfigLoader};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };
    let logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Sync {
            group,
            state,
            out,
            since,
        } => sync::execute(&config, &group, state, out, since, cli.json).await,
        Commands::Search { since } => search::execute(&config, since, cli.json).await,
        Commands::ResumePoint { group, state } => {
            resume_point::execute(&config, &group, state, cli.json)
        }
    };

    // Flush buffered file logs before a possible exit
    drop(logger);
    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
