//! Error types for the bot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for bot operations
///
/// Rate-limit suppression is deliberately absent: a dropped outbound message
/// is reported through [`crate::messaging::SendOutcome`], not as an error.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text-generation failures (network, auth, quota, timeout, bad payload)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Identity or status lookups against an external service failed
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Chat connection errors (connect, authenticate, write)
    #[error("Chat error: {0}")]
    Chat(String),

    /// Missing credentials for an external service
    #[error("Missing credentials for {0}")]
    MissingCredentials(String),
}

impl BotError {
    /// Returns true when the error came from the text-generation provider
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}

/// Result type alias for bot operations
///
/// Uses `anyhow::Error` so context can be attached while the typed
/// [`BotError`] stays reachable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = BotError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_generation_error_display() {
        let error = BotError::Generation("quota exceeded".to_string());
        assert_eq!(error.to_string(), "Generation error: quota exceeded");
        assert!(error.is_generation());
    }

    #[test]
    fn test_lookup_error_is_not_generation() {
        let error = BotError::Lookup("helix returned 500".to_string());
        assert_eq!(error.to_string(), "Lookup error: helix returned 500");
        assert!(!error.is_generation());
    }

    #[test]
    fn test_missing_credentials_display() {
        let error = BotError::MissingCredentials("openai".to_string());
        assert_eq!(error.to_string(), "Missing credentials for openai");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(BotError::Generation("timeout".to_string()).into());
        let err = result.unwrap_err();
        let typed = err.downcast_ref::<BotError>().expect("typed error");
        assert!(typed.is_generation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BotError>();
    }
}
