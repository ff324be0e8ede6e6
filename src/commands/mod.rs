/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `run`: Connect to Twitch chat and serve commands
- `ask`: Answer one question locally and print the reply

Both build the same components from [`Config`]: provider, session store,
ask command and, for `run`, the rate-limited sender.
*/

use crate::ask::AskCommand;
use crate::chat::ChatClient;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::messaging::MessageSender;
use crate::providers::create_provider;
use crate::ratelimit::RateLimiter;
use crate::session::{SessionConfig, SessionStore};
use std::sync::Arc;

/// Build the ask command with a fresh in-memory session store
///
/// # Errors
///
/// Returns error if the provider cannot be created (unknown type, missing
/// API key)
pub fn build_ask_command(config: &Config, clock: Arc<dyn Clock>) -> Result<Arc<AskCommand>> {
    let provider = create_provider(&config.provider)?;
    tracing::info!(
        provider = %config.provider.provider_type,
        model = %provider.model(),
        "Provider ready"
    );

    let sessions = Arc::new(SessionStore::new(
        SessionConfig {
            idle_timeout: config.ask.idle_timeout(),
        },
        clock,
    ));

    Ok(Arc::new(AskCommand::new(
        provider,
        sessions,
        config.ask.clone(),
    )))
}

/// Build the outbound sender for `client`
pub fn build_sender(
    config: &Config,
    client: Arc<dyn ChatClient>,
    clock: Arc<dyn Clock>,
) -> Arc<MessageSender> {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone(), clock));
    Arc::new(MessageSender::new(
        client,
        limiter,
        config.chat.creator_channel.clone(),
    ))
}

// Chat bot command handler
pub mod run {
    //! Long-running chat mode.
    //!
    //! Connects to Twitch IRC, wires the bot components together and
    //! dispatches inbound messages until the connection closes or the
    //! process receives Ctrl-C.

    use super::*;
    use crate::bot::Bot;
    use crate::chat::TwitchIrcClient;

    /// Connect to chat and serve commands
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Errors
    ///
    /// Returns error if chat credentials are missing, the provider cannot be
    /// created or the connection fails. Per-message failures are logged and
    /// never end the loop.
    pub async fn run_bot(config: Config) -> Result<()> {
        config.validate_chat()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ask = build_ask_command(&config, clock.clone())?;

        let (client, inbound) = TwitchIrcClient::connect(&config.chat).await?;
        let client = Arc::new(client);
        let sender = build_sender(&config, client.clone(), clock);

        let bot = Arc::new(Bot::new(
            client.username(),
            &config.chat.command_prefix,
            ask,
            sender,
        ));

        tracing::info!(
            channels = ?config.chat.channels,
            scope = ?config.rate_limit.scope,
            "Bot is running"
        );

        tokio::select! {
            _ = bot.run(inbound) => {
                tracing::warn!("Chat connection closed, shutting down");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
            }
        }

        Ok(())
    }
}

// One-shot ask command handler
pub mod ask {
    //! Local question mode.
    //!
    //! Runs the ask protocol once against the configured provider without a
    //! chat connection. Useful for checking provider credentials and prompt
    //! behaviour.

    use super::*;
    use crate::ask::AskRequest;
    use crate::messaging::format_numbers;

    /// Answer `message` as `user` in `channel`
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created or generation fails
    pub async fn answer_locally(
        config: &Config,
        channel: &str,
        user: &str,
        message: &str,
    ) -> Result<String> {
        let ask = build_ask_command(config, Arc::new(SystemClock))?;
        let reply = ask
            .execute(&AskRequest::new(channel, user, message))
            .await?;
        Ok(format_numbers(&reply))
    }

    /// Answer one question and print the reply to stdout
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `channel` - Channel the question is attributed to
    /// * `user` - Username the question is attributed to
    /// * `message` - Question words, joined with spaces
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot be created or generation fails
    pub async fn run_ask(
        config: Config,
        channel: String,
        user: String,
        message: Vec<String>,
    ) -> Result<()> {
        let message = message.join(" ");
        let reply = answer_locally(&config, &channel, &user, &message).await?;
        println!("{}", reply);
        Ok(())
    }
}
