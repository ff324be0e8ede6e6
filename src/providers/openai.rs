//! OpenAI chat-completions provider
//!
//! Talks to `POST {api_base}/chat/completions` with bearer authentication.
//! Any OpenAI-compatible endpoint works as long as it returns the standard
//! `choices[0].message` shape.

use crate::config::OpenAiConfig;
use crate::error::{BotError, Result};
use crate::providers::{CompletionRequest, CompletionResponse, Message, Provider, TokenUsage};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI API provider
///
/// # Examples
///
/// ```no_run
/// use raynna_bot::config::OpenAiConfig;
/// use raynna_bot::providers::{CompletionRequest, Message, OpenAiProvider, Provider};
///
/// # async fn example() -> raynna_bot::error::Result<()> {
/// let config = OpenAiConfig {
///     api_key: Some("sk-...".to_string()),
///     ..OpenAiConfig::default()
/// };
/// let provider = OpenAiProvider::new(config, 30)?;
/// let request = CompletionRequest {
///     messages: vec![Message::user("Hello!")],
///     max_tokens: 70,
///     temperature: 0.6,
/// };
/// let response = provider.complete(&request).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
    api_key: String,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

/// Response body from the chat-completions endpoint
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, model and API key
    /// * `timeout_seconds` - Per-request HTTP timeout
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingCredentials`] when no API key is configured,
    /// or a generation error if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig, timeout_seconds: u64) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BotError::MissingCredentials("openai".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("raynna-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BotError::Generation(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            "Sending OpenAI request: {} messages, temperature={}",
            request.messages.len(),
            request.temperature
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI request failed: {}", e);
                BotError::Generation(format!("OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("OpenAI returned error {}: {}", status, error_text);
            return Err(BotError::Generation(format!(
                "OpenAI returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}", e);
            BotError::Generation(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BotError::Generation("OpenAI response had no content".to_string()))?;

        let message = Message::assistant(content.trim());
        Ok(match parsed.usage {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        })
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
