//! In-process fake chat client for tests
//!
//! [`FakeChatClient`] records every line passed to [`ChatClient::send`] and
//! answers [`ChatClient::is_elevated`] from a configurable channel set, so the
//! sender and bot can be exercised without a network connection.
//!
//! # Example
//!
//! ```
//! use raynna_bot::chat::{ChatClient, FakeChatClient};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let chat = FakeChatClient::new().with_elevated("modchan");
//! chat.send("#modchan", "hello").await.unwrap();
//! assert_eq!(chat.sent(), vec![("modchan".to_string(), "hello".to_string())]);
//! assert!(chat.is_elevated("modchan").await.unwrap());
//! # }
//! ```

use crate::chat::{normalize_channel, ChatClient};
use crate::error::{BotError, Result};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Recording [`ChatClient`]
#[derive(Debug, Default)]
pub struct FakeChatClient {
    sent: Mutex<Vec<(String, String)>>,
    elevated: HashSet<String>,
    fail_lookups: bool,
    fail_sends: bool,
}

impl FakeChatClient {
    /// Create a client that is elevated nowhere
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the bot as moderator/VIP in `channel`
    pub fn with_elevated(mut self, channel: &str) -> Self {
        self.elevated.insert(normalize_channel(channel));
        self
    }

    /// Make every status lookup fail
    pub fn with_failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Make every send fail
    pub fn with_failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Lines sent so far as (normalized channel, text)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts sent to one channel
    pub fn sent_to(&self, channel: &str) -> Vec<String> {
        let channel = normalize_channel(channel);
        self.sent()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        if self.fail_sends {
            return Err(BotError::Chat("fake send failure".to_string()).into());
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((normalize_channel(channel), text.to_string()));
        Ok(())
    }

    async fn is_elevated(&self, channel: &str) -> Result<bool> {
        if self.fail_lookups {
            return Err(BotError::Lookup("fake lookup failure".to_string()).into());
        }
        Ok(self.elevated.contains(&normalize_channel(channel)))
    }
}
