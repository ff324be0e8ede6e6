//! Raynna Bot - Twitch chat bot library
//!
//! This library provides the core functionality for the Raynna chat bot:
//! conversational question answering with per-user memory, rate-limited
//! outbound messaging, and the Twitch IRC connection.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `ask`: The ask command and its system prompt
//! - `bot`: Command parsing and dispatch of inbound chat messages
//! - `chat`: Chat client abstraction, Twitch IRC client and a test fake
//! - `session`: Per-(channel, user) conversation store with idle eviction
//! - `ratelimit`: Fixed-window outbound rate limiter
//! - `messaging`: Privilege-aware, rate-limited sender
//! - `providers`: Text-generation provider abstraction (OpenAI, Ollama)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use raynna_bot::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     raynna_bot::commands::run::run_bot(config).await
//! }
//! ```

pub mod ask;
pub mod bot;
pub mod chat;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod messaging;
pub mod providers;
pub mod ratelimit;
pub mod session;

// Re-export commonly used types
pub use ask::{AskCommand, AskRequest};
pub use bot::Bot;
pub use chat::{ChatClient, ChatMessage};
pub use config::Config;
pub use error::{BotError, Result};
pub use messaging::{MessageSender, SendOutcome};
pub use ratelimit::{RateDecision, RateLimiter};
pub use session::SessionStore;

#[cfg(test)]
pub mod test_utils;
