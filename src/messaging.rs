//! Outbound message path
//!
//! Every reply leaves the bot through [`MessageSender::send_message`], which
//! decides the sender's privilege, consults the [`RateLimiter`] and formats
//! large numbers before handing the line to the [`ChatClient`].

use crate::chat::{normalize_channel, ChatClient};
use crate::error::Result;
use crate::ratelimit::{RateDecision, RateLimiter};

use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};

/// What happened to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The line was written; holds the text actually sent
    Sent(String),
    /// The rate limit window for this channel was full
    Suppressed,
    /// The text was empty after trimming
    Skipped,
}

impl SendOutcome {
    /// Whether a line reached the chat client
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Rate-limited, privilege-aware sender
pub struct MessageSender {
    client: Arc<dyn ChatClient>,
    limiter: Arc<RateLimiter>,
    creator_channel: Option<String>,
}

impl MessageSender {
    /// Create a sender
    ///
    /// # Arguments
    ///
    /// * `client` - Chat connection used for writing and status lookups
    /// * `limiter` - Shared outbound rate limiter
    /// * `creator_channel` - Channel that always gets the privileged budget
    pub fn new(
        client: Arc<dyn ChatClient>,
        limiter: Arc<RateLimiter>,
        creator_channel: Option<String>,
    ) -> Self {
        Self {
            client,
            limiter,
            creator_channel: creator_channel
                .map(|c| normalize_channel(&c))
                .filter(|c| !c.is_empty()),
        }
    }

    async fn is_privileged(&self, channel: &str) -> bool {
        if self.creator_channel.as_deref() == Some(channel) {
            return true;
        }
        match self.client.is_elevated(channel).await {
            Ok(elevated) => elevated,
            Err(e) => {
                tracing::warn!(channel, error = %e, "Status lookup failed, using standard limit");
                false
            }
        }
    }

    /// Send `text` to `channel` if the rate budget allows it
    ///
    /// # Errors
    ///
    /// Returns the chat client's error if writing the line fails. Suppression
    /// and empty input are reported through [`SendOutcome`].
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<SendOutcome> {
        let channel = normalize_channel(channel);
        if text.trim().is_empty() {
            tracing::debug!(channel = %channel, "Skipping empty message");
            return Ok(SendOutcome::Skipped);
        }

        let privileged = self.is_privileged(&channel).await;
        match self.limiter.try_message(&channel, privileged) {
            RateDecision::Suppressed { limit } => {
                tracing::warn!(channel = %channel, limit, "Bot reached rate limit");
                return Ok(SendOutcome::Suppressed);
            }
            RateDecision::Allowed { count, limit } => {
                tracing::debug!(channel = %channel, count, limit, "Rate budget consumed");
            }
        }

        let formatted = format_numbers(text);
        tracing::info!(channel = %channel, "{}", formatted);
        self.client.send(&channel, &formatted).await?;
        Ok(SendOutcome::Sent(formatted))
    }
}

fn large_number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\s)(\d{5,})").ok()).as_ref()
}

/// Insert thousands separators into runs of five or more digits that follow
/// whitespace
///
/// # Examples
///
/// ```
/// use raynna_bot::messaging::format_numbers;
///
/// assert_eq!(format_numbers("xp: 1234567"), "xp: 1,234,567");
/// assert_eq!(format_numbers("year 2024"), "year 2024");
/// assert_eq!(format_numbers("id12345"), "id12345");
/// ```
pub fn format_numbers(text: &str) -> String {
    let Some(re) = large_number_regex() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        format!("{}{}", &caps[1], group_thousands(&caps[2]))
    })
    .into_owned()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
