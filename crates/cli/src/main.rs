mod cli;
mod commands;
mod config;
mod utils;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::commands::{
    handle_config_command, handle_inspect_command, handle_providers_command,
    handle_rewrite_command,
};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys can live in a .env file next to the project.
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Rewrite {
            input,
            output,
            provider,
            model,
            fallback_provider,
            fallback_model,
            strict,
            no_classify,
            include_nav,
        } => {
            handle_rewrite_command(
                input,
                output,
                provider,
                model,
                fallback_provider,
                fallback_model,
                strict,
                no_classify,
                include_nav,
                &config,
                cli.dry_run,
            )
            .await
        }
        Commands::Inspect { input } => handle_inspect_command(input).await,
        Commands::Providers => handle_providers_command(),
        Commands::Config { command } => handle_config_command(command, cli.dry_run).await,
    }
}
