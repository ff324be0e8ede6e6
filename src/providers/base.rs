//! Base provider trait and common types
//!
//! This module defines the Provider trait that every text-generation backend
//! implements, along with the message, request and response types exchanged
//! with it.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for conversation
///
/// Represents a message sent to or received from the provider. Roles follow
/// the chat-completion convention: `system`, `user` or `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use raynna_bot::providers::Message;
    ///
    /// let msg = Message::user("Hello, bot!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use raynna_bot::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, chat!");
    /// assert!(msg.is_assistant());
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Whether this message was produced by the assistant
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// A single generation request
///
/// Carries the full message list (system instruction first) together with
/// the sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Ordered messages, system instruction first
    pub messages: Vec<Message>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use raynna_bot::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The generated message
    pub message: Message,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a response without usage information
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Create a response with token usage
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }

    /// Generated text with surrounding whitespace removed
    pub fn text(&self) -> &str {
        self.message.content.trim()
    }
}

/// Provider trait for text-generation backends
///
/// Implementations must report every transport, authentication or payload
/// failure as [`crate::error::BotError::Generation`] so callers can tell
/// generation failures apart from other errors.
///
/// # Examples
///
/// ```no_run
/// use raynna_bot::providers::{CompletionRequest, CompletionResponse, Message, Provider};
/// use raynna_bot::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
///         let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(CompletionResponse::new(Message::assistant(last)))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for `request`
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Name of the model used for generation
    fn model(&self) -> String {
        "unknown".to_string()
    }
}
