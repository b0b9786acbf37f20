//! podrag CLI entry point.

use anyhow::Result;
use clap::Parser;
use podrag::cli::{commands, Cli, Commands};
use podrag::config::Settings;
use podrag::logging;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::resolve(config_path.as_ref())?;

    let run_log = logging::init(&settings, cli.verbose);

    std::fs::create_dir_all(settings.data_dir())?;

    let result = run(&cli.command, config_path, &settings).await;

    logging::archive_log(&settings, &run_log).await;

    result
}

async fn run(command: &Commands, config_path: Option<PathBuf>, settings: &Settings) -> Result<()> {
    match command {
        Commands::Sync => {
            commands::run_sync(settings).await?;
        }

        Commands::Build { sync } => {
            commands::run_build(*sync, settings).await?;
        }

        Commands::Query => {
            commands::run_query(settings).await?;
        }

        Commands::Ask { question } => {
            commands::run_ask(question, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Folders { prefix } => {
            commands::run_folders(prefix.as_deref(), settings).await?;
        }

        Commands::Upload { path, key } => {
            commands::run_upload(path, key.as_deref(), settings).await?;
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_config(action, &path, settings)?;
        }
    }

    Ok(())
}
