//! Raynna Bot - Twitch chat bot
//!
#![doc = "Raynna Bot - Twitch chat bot"]
#![doc = "Main entry point for the Raynna chat bot application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use raynna_bot::cli::{Cli, Commands};
use raynna_bot::commands;
use raynna_bot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Run => {
            tracing::info!("Starting chat bot");
            commands::run::run_bot(config).await?;
            Ok(())
        }
        Commands::Ask {
            channel,
            user,
            message,
        } => {
            tracing::debug!("Asking locally as {} in {}", user, channel);
            commands::ask::run_ask(config, channel, user, message).await?;
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the bot logs at info, or debug with
/// `--verbose`.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "raynna_bot=debug"
    } else {
        "raynna_bot=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}
