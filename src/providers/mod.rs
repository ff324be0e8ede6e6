//! Provider module
//!
//! This module contains the text-generation abstraction and its
//! implementations for OpenAI-compatible endpoints and Ollama.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{CompletionRequest, CompletionResponse, Message, Provider, TokenUsage};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{BotError, Result};
use std::sync::Arc;

/// Provider types accepted by [`create_provider`]
pub const PROVIDER_TYPES: [&str; 2] = ["openai", "ollama"];

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration; `provider_type` selects the backend
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    match config.provider_type.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(
            config.openai.clone(),
            config.timeout_seconds,
        )?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.ollama.clone(),
            config.timeout_seconds,
        )?)),
        other => Err(BotError::Config(format!("Unknown provider type: {}", other)).into()),
    }
}
