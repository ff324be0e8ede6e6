//! Outbound message rate limiting
//!
//! A fixed-window counter: each key gets a window that starts with the first
//! message after the previous window expired and counts messages until the
//! window length has elapsed. Windows reset wholesale, so a burst straddling a
//! boundary can pass up to twice the limit in a short span.

use crate::chat::normalize_channel;
use crate::clock::Clock;
use crate::config::{RateLimitConfig, RateLimitScope};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const GLOBAL_KEY: &str = "*";

/// Outcome of [`RateLimiter::try_message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The message may be sent; `count` includes it
    Allowed {
        /// Messages counted in the current window
        count: u32,
        /// Effective limit for this call
        limit: u32,
    },
    /// The window is full; the message must be dropped
    Suppressed {
        /// Effective limit for this call
        limit: u32,
    },
}

impl RateDecision {
    /// Whether the message may be sent
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// Fixed-window counter keyed by channel or shared globally
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    /// Create a limiter
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Limit that applies to a privileged or standard sender
    pub fn limit_for(&self, is_privileged: bool) -> u32 {
        if is_privileged {
            self.config.privileged_limit
        } else {
            self.config.standard_limit
        }
    }

    fn key_for(&self, channel: &str) -> String {
        match self.config.scope {
            RateLimitScope::PerChannel => normalize_channel(channel),
            RateLimitScope::Global => GLOBAL_KEY.to_string(),
        }
    }

    /// Count a message for `channel` if the window has room
    ///
    /// The check and the increment happen under one lock, so concurrent
    /// callers can never push a window past its limit.
    pub fn try_message(&self, channel: &str, is_privileged: bool) -> RateDecision {
        let key = self.key_for(channel);
        let limit = self.limit_for(is_privileged);
        let now = self.clock.now();

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(key.clone()).or_insert(RateWindow {
            window_start: now,
            count: 0,
        });

        if window.count == 0
            || now.saturating_duration_since(window.window_start) >= self.config.window()
        {
            window.window_start = now;
            window.count = 1;
            return RateDecision::Allowed { count: 1, limit };
        }

        if window.count < limit {
            window.count += 1;
            return RateDecision::Allowed {
                count: window.count,
                limit,
            };
        }

        tracing::info!(
            key = %key,
            count = window.count,
            limit,
            "Rate limit reached, dropping message"
        );
        RateDecision::Suppressed { limit }
    }

    /// Messages counted in the current window for `channel`
    pub fn current_count(&self, channel: &str) -> u32 {
        let key = self.key_for(channel);
        let now = self.clock.now();
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .filter(|w| now.saturating_duration_since(w.window_start) < self.config.window())
            .map_or(0, |w| w.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn limiter(scope: RateLimitScope) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = RateLimitConfig {
            scope,
            ..RateLimitConfig::default()
        };
        (RateLimiter::new(config, clock.clone()), clock)
    }

    #[test]
    fn test_standard_limit_allows_twenty_then_suppresses() {
        let (limiter, _) = limiter(RateLimitScope::PerChannel);
        for i in 1..=20 {
            assert_eq!(
                limiter.try_message("chan", false),
                RateDecision::Allowed { count: i, limit: 20 }
            );
        }
        assert_eq!(
            limiter.try_message("chan", false),
            RateDecision::Suppressed { limit: 20 }
        );
        assert_eq!(limiter.current_count("chan"), 20);
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let (limiter, clock) = limiter(RateLimitScope::PerChannel);
        for _ in 0..21 {
            limiter.try_message("chan", false);
        }

        clock.advance(Duration::from_secs(29));
        assert!(!limiter.try_message("chan", false).is_allowed());

        clock.advance(Duration::from_secs(1));
        assert_eq!(
            limiter.try_message("chan", false),
            RateDecision::Allowed { count: 1, limit: 20 }
        );
    }

    #[test]
    fn test_privileged_limit_is_independent_per_channel() {
        let (limiter, _) = limiter(RateLimitScope::PerChannel);
        for _ in 0..20 {
            assert!(limiter.try_message("standard", false).is_allowed());
        }
        assert!(!limiter.try_message("standard", false).is_allowed());

        for _ in 0..100 {
            assert!(limiter.try_message("owner", true).is_allowed());
        }
        assert!(!limiter.try_message("owner", true).is_allowed());
    }

    #[test]
    fn test_global_scope_shares_one_window() {
        let (limiter, _) = limiter(RateLimitScope::Global);
        for i in 0..20 {
            let channel = if i % 2 == 0 { "a" } else { "b" };
            assert!(limiter.try_message(channel, false).is_allowed());
        }
        assert!(!limiter.try_message("c", false).is_allowed());
    }

    #[test]
    fn test_count_above_lowered_limit_is_suppressed() {
        let (limiter, _) = limiter(RateLimitScope::PerChannel);
        for _ in 0..50 {
            limiter.try_message("chan", true);
        }
        assert!(!limiter.try_message("chan", false).is_allowed());
        assert!(limiter.try_message("chan", true).is_allowed());
    }

    #[test]
    fn test_fixed_window_boundary_burst_reaches_twice_the_limit() {
        let (limiter, clock) = limiter(RateLimitScope::PerChannel);
        assert!(limiter.try_message("chan", false).is_allowed());

        clock.advance(Duration::from_millis(29_900));
        for _ in 0..19 {
            assert!(limiter.try_message("chan", false).is_allowed());
        }

        clock.advance(Duration::from_millis(100));
        let mut passed = 0;
        for _ in 0..25 {
            if limiter.try_message("chan", false).is_allowed() {
                passed += 1;
            }
        }
        assert_eq!(passed, 20);
    }

    #[test]
    fn test_channel_keys_are_normalized() {
        let (limiter, _) = limiter(RateLimitScope::PerChannel);
        limiter.try_message("#Chan", false);
        assert_eq!(limiter.current_count("chan"), 1);
    }
}
