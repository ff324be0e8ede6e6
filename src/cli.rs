//! Command-line interface definition
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// Raynna Bot - Twitch chat bot that answers questions
#[derive(Parser, Debug, Clone)]
#[command(name = "raynna-bot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the provider from config (openai, ollama)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Connect to Twitch chat and serve commands
    Run,

    /// Ask a single question locally without connecting to chat
    Ask {
        /// Channel the question is attributed to
        #[arg(long, default_value = "local")]
        channel: String,

        /// Username the question is attributed to
        #[arg(short, long, default_value = "local_user")]
        user: String,

        /// The question text (`reset` clears the conversation)
        message: Vec<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            provider: None,
            command: Commands::Run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from(["raynna-bot", "--verbose", "run"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run));
    }

    #[test]
    fn test_cli_parses_ask_with_words() {
        let cli = Cli::try_parse_from([
            "raynna-bot",
            "ask",
            "--user",
            "viewer",
            "tell",
            "me",
            "a",
            "joke",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask {
                channel,
                user,
                message,
            } => {
                assert_eq!(channel, "local");
                assert_eq!(user, "viewer");
                assert_eq!(message.join(" "), "tell me a joke");
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli = Cli::try_parse_from(["raynna-bot", "-c", "bot.yaml", "run"]).unwrap();
        assert_eq!(cli.config, Some("bot.yaml".to_string()));
    }
}
