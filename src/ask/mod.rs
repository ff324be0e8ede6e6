//! The ask command
//!
//! Turns a chat question into a short model-generated reply while keeping a
//! per-user conversation so follow-up questions have context. The whole
//! read → generate → write sequence for one (channel, user) runs under the
//! session's async lock, so two questions from the same user never see each
//! other's half-finished state.

pub mod prompt;

use crate::config::AskConfig;
use crate::error::{BotError, Result};
use crate::providers::{CompletionRequest, Message, Provider};
use crate::session::SessionStore;

use prompt::{build_system_prompt, is_creative_request, PromptContext};
use std::sync::Arc;

/// Reply when the argument is empty
pub const USAGE_REPLY: &str = "Please provide a question after !ask.";
/// Reply after clearing a non-empty conversation
pub const RESET_REPLY: &str = "I have now reset your conversation with me!";
/// Reply when there was nothing to clear
pub const NOTHING_TO_RESET_REPLY: &str = "You don't have any conversation with me saved.";

/// One ask invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    /// Channel the question was asked in
    pub channel: String,
    /// Login name of the requester
    pub username: String,
    /// Everything after the trigger word
    pub argument: String,
}

impl AskRequest {
    /// Build a request
    pub fn new(channel: &str, username: &str, argument: &str) -> Self {
        Self {
            channel: channel.to_string(),
            username: username.to_string(),
            argument: argument.to_string(),
        }
    }
}

/// Conversational question answering backed by a [`Provider`]
pub struct AskCommand {
    provider: Arc<dyn Provider>,
    sessions: Arc<SessionStore>,
    config: AskConfig,
}

impl AskCommand {
    /// Create the command
    ///
    /// # Arguments
    ///
    /// * `provider` - Text-generation backend
    /// * `sessions` - Conversation store shared with the rest of the bot
    /// * `config` - Prompt, sampling and history settings
    pub fn new(provider: Arc<dyn Provider>, sessions: Arc<SessionStore>, config: AskConfig) -> Self {
        Self {
            provider,
            sessions,
            config,
        }
    }

    /// Trigger words that route to this command
    pub fn triggers(&self) -> &[String] {
        &self.config.triggers
    }

    /// Conversation store used by this command
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Answer one question
    ///
    /// Returns the reply to post in chat, truncated to the configured number
    /// of characters. The untruncated answer is what gets stored in history.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Generation`] when the provider fails or exceeds the
    /// generation timeout. The session is left without a new turn in that case.
    pub async fn execute(&self, request: &AskRequest) -> Result<String> {
        let question = request.argument.trim();
        if question.is_empty() {
            return Ok(USAGE_REPLY.to_string());
        }

        let channel = request.channel.as_str();
        let user = request.username.as_str();

        let _guard = self.sessions.lock(channel, user).await;

        if question.eq_ignore_ascii_case("reset") {
            let reply = if self.sessions.reset_explicit(channel, user) {
                RESET_REPLY
            } else {
                NOTHING_TO_RESET_REPLY
            };
            return Ok(reply.to_string());
        }

        self.sessions.reset_if_inactive(channel, user);
        self.sessions.touch_activity(channel, user);
        let history = self
            .sessions
            .get_turns(channel, user, self.config.max_history_turns);

        let previous_replies: Vec<String> = history
            .iter()
            .filter(|m| m.is_assistant())
            .map(|m| m.content.clone())
            .collect();

        let creative = is_creative_request(question, &self.config.creative_keywords);
        let date = chrono::Local::now().format("%A, %B %-d, %Y %H:%M").to_string();
        let system = build_system_prompt(&PromptContext {
            date: &date,
            username: user,
            creator: &self.config.creator,
            char_limit: self.config.prompt_char_limit,
            creative,
            previous_replies: &previous_replies,
        });

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system));
        messages.extend(history);
        messages.push(Message::user(question));

        let completion = CompletionRequest {
            messages,
            max_tokens: self.config.max_output_tokens,
            temperature: if creative {
                self.config.creative_temperature
            } else {
                self.config.temperature
            },
        };

        let mut answer = self.generate(&completion).await?;
        let mut attempts = 0;
        while attempts < self.config.max_regenerate_attempts
            && previous_replies.iter().any(|prev| *prev == answer)
        {
            tracing::debug!(channel, user, attempts, "Answer repeats history, regenerating");
            answer = self.generate(&completion).await?;
            attempts += 1;
        }

        self.sessions.record_turn(channel, user, question, &answer);

        Ok(truncate_chars(&answer, self.config.max_reply_chars))
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let timeout = self.config.generation_timeout();
        let response = tokio::time::timeout(timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                BotError::Generation(format!(
                    "provider did not answer within {}s",
                    timeout.as_secs()
                ))
            })?
            .map_err(into_generation_error)?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Generation usage"
            );
        }
        Ok(response.text().to_string())
    }
}

fn into_generation_error(err: anyhow::Error) -> anyhow::Error {
    if err
        .downcast_ref::<BotError>()
        .is_some_and(BotError::is_generation)
    {
        err
    } else {
        BotError::Generation(err.to_string()).into()
    }
}

/// Keep at most `max_chars` characters of `text`
///
/// # Examples
///
/// ```
/// use raynna_bot::ask::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
