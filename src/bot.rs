//! Command dispatch
//!
//! [`Bot`] reads inbound chat lines, recognises `<prefix><trigger> <argument>`
//! commands and routes ask triggers to the [`AskCommand`]. Replies go out
//! through the [`MessageSender`], so every one of them is rate limited.

use crate::ask::{AskCommand, AskRequest};
use crate::chat::ChatMessage;
use crate::error::{BotError, Result};
use crate::messaging::{MessageSender, SendOutcome};

use std::sync::Arc;
use tokio::sync::mpsc;

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Trigger word, lower-cased, without the prefix
    pub trigger: String,
    /// Remainder of the line after the trigger, trimmed
    pub argument: &'a str,
}

/// Split `text` into a trigger and argument if it starts with `prefix`
///
/// # Examples
///
/// ```
/// use raynna_bot::bot::parse_command;
///
/// let cmd = parse_command("!Ask  what is rust? ", "!").unwrap();
/// assert_eq!(cmd.trigger, "ask");
/// assert_eq!(cmd.argument, "what is rust?");
/// assert!(parse_command("hello there", "!").is_none());
/// ```
pub fn parse_command<'a>(text: &'a str, prefix: &str) -> Option<ParsedCommand<'a>> {
    let body = text.trim().strip_prefix(prefix)?;
    let (trigger, argument) = match body.split_once(char::is_whitespace) {
        Some((trigger, argument)) => (trigger, argument.trim()),
        None => (body, ""),
    };
    if trigger.is_empty() {
        return None;
    }
    Some(ParsedCommand {
        trigger: trigger.to_lowercase(),
        argument,
    })
}

/// Chat bot wiring commands to the outbound sender
pub struct Bot {
    username: String,
    prefix: String,
    ask: Arc<AskCommand>,
    sender: Arc<MessageSender>,
}

impl Bot {
    /// Create a bot
    ///
    /// # Arguments
    ///
    /// * `username` - The bot's own login; its messages are ignored
    /// * `prefix` - Command prefix, usually `!`
    /// * `ask` - The ask command
    /// * `sender` - Rate-limited outbound sender
    pub fn new(
        username: &str,
        prefix: &str,
        ask: Arc<AskCommand>,
        sender: Arc<MessageSender>,
    ) -> Self {
        Self {
            username: username.to_lowercase(),
            prefix: prefix.to_string(),
            ask,
            sender,
        }
    }

    fn is_ask_trigger(&self, trigger: &str) -> bool {
        self.ask
            .triggers()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(trigger))
    }

    /// Handle one inbound message
    ///
    /// Returns `Ok(None)` when the message produced no outbound line: not a
    /// command, sent by the bot itself, or a generation failure (logged).
    ///
    /// # Errors
    ///
    /// Returns an error if the reply could not be written to chat.
    pub async fn handle_message(&self, msg: &ChatMessage) -> Result<Option<SendOutcome>> {
        if msg.username.eq_ignore_ascii_case(&self.username) {
            return Ok(None);
        }

        let Some(command) = parse_command(&msg.text, &self.prefix) else {
            return Ok(None);
        };
        if !self.is_ask_trigger(&command.trigger) {
            tracing::trace!(trigger = %command.trigger, "Ignoring unknown command");
            return Ok(None);
        }

        tracing::debug!(
            channel = %msg.channel,
            user = %msg.username,
            trigger = %command.trigger,
            "Running ask command"
        );

        let request = AskRequest::new(&msg.channel, &msg.username, command.argument);
        let reply = match self.ask.execute(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.downcast_ref::<BotError>()
                    .is_some_and(BotError::is_generation)
                {
                    tracing::warn!(
                        channel = %msg.channel,
                        user = %msg.username,
                        error = %e,
                        "Ask command failed, no reply sent"
                    );
                    return Ok(None);
                }
                return Err(e);
            }
        };

        self.sender
            .send_message(&msg.channel, &reply)
            .await
            .map(Some)
    }

    /// Consume inbound messages until the channel closes
    ///
    /// Each message is handled on its own task, so a slow generation never
    /// blocks other users.
    pub async fn run(self: Arc<Self>, mut inbound: mpsc::UnboundedReceiver<ChatMessage>) {
        while let Some(msg) = inbound.recv().await {
            let bot = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = bot.handle_message(&msg).await {
                    tracing::error!(channel = %msg.channel, error = %e, "Failed to handle message");
                }
            });
        }
        tracing::info!("Inbound chat stream closed");
    }
}
