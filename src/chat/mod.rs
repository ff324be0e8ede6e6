//! Chat connection abstraction
//!
//! The bot talks to chat only through [`ChatClient`]. The Twitch IRC client
//! is the production implementation; [`fake::FakeChatClient`] replaces it in
//! tests.

pub mod fake;
pub mod irc;
pub mod twitch;

pub use fake::FakeChatClient;
pub use twitch::TwitchIrcClient;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Outbound side of a chat connection
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send `text` to `channel`
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BotError::Chat`] if the line cannot be written.
    async fn send(&self, channel: &str, text: &str) -> Result<()>;

    /// Whether the bot account is moderator, VIP or broadcaster in `channel`
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BotError::Lookup`] if the status is unknown.
    async fn is_elevated(&self, channel: &str) -> Result<bool>;
}

/// Inbound chat line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Normalized channel (no `#`, lower-case)
    pub channel: String,
    /// Sender login name
    pub username: String,
    /// Sender display name, falling back to the login
    pub display_name: String,
    /// Message body
    pub text: String,
    /// Badge name to version, from the `badges` tag
    pub badges: HashMap<String, String>,
}

impl ChatMessage {
    /// Build a plain message without badges
    pub fn new(channel: &str, username: &str, text: impl Into<String>) -> Self {
        Self {
            channel: normalize_channel(channel),
            username: username.to_lowercase(),
            display_name: username.to_string(),
            text: text.into(),
            badges: HashMap::new(),
        }
    }
}

/// Whether a badge set grants elevated chat status
pub fn is_privileged_badge_set(badges: &HashMap<String, String>) -> bool {
    ["moderator", "vip", "broadcaster"]
        .iter()
        .any(|badge| badges.contains_key(*badge))
}

/// Strip leading `#` markers and lower-case a channel handle
///
/// # Examples
///
/// ```
/// use raynna_bot::chat::normalize_channel;
///
/// assert_eq!(normalize_channel("#RaynnaCS"), "raynnacs");
/// assert_eq!(normalize_channel("daman_gg"), "daman_gg");
/// ```
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_lowercase()
}
