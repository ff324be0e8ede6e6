//! Per-(channel, user) conversation sessions
//!
//! [`SessionStore`] keeps the short-lived history the ask command feeds back
//! to the provider. Sessions live in memory for the lifetime of the process;
//! they are cleared, never removed, when they go idle or the user resets them.
//!
//! The map is guarded by a synchronous mutex that is never held across an
//! `.await`. Callers that need a read → generate → write sequence to be atomic
//! for one user take the per-key async lock from [`SessionStore::lock`].

mod lock;

pub use lock::{KeyedLocks, SessionGuard};

use crate::chat::normalize_channel;
use crate::clock::Clock;
use crate::providers::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Identity of a session: normalized channel and lower-cased user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// Channel without leading `#`, lower-cased
    pub channel: String,
    /// Lower-cased login name
    pub user: String,
}

impl SessionKey {
    /// Build a key from raw chat identifiers
    ///
    /// # Examples
    ///
    /// ```
    /// use raynna_bot::session::SessionKey;
    ///
    /// let key = SessionKey::new("#RaynnaCS", "Viewer");
    /// assert_eq!(key.channel, "raynnacs");
    /// assert_eq!(key.user, "viewer");
    /// ```
    pub fn new(channel: &str, user: &str) -> Self {
        Self {
            channel: normalize_channel(channel),
            user: user.trim().to_lowercase(),
        }
    }
}

/// One user message and the reply generated for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// What the user asked
    pub user_message: String,
    /// What the bot answered
    pub bot_response: String,
}

/// Stored state for one key
#[derive(Debug, Clone)]
struct Session {
    turns: Vec<Turn>,
    last_activity: Option<Instant>,
}

impl Session {
    fn empty() -> Self {
        Self {
            turns: Vec::new(),
            last_activity: None,
        }
    }
}

/// Session store settings
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Idle time after which history is cleared on the next check
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(120),
        }
    }
}

/// In-memory conversation store with idle eviction
pub struct SessionStore {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<SessionKey, Session>>,
    locks: KeyedLocks<SessionKey>,
}

impl SessionStore {
    /// Create an empty store
    ///
    /// # Arguments
    ///
    /// * `config` - Idle timeout settings
    /// * `clock` - Time source used for activity stamps and idle checks
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            sessions: Mutex::new(HashMap::new()),
            locks: KeyedLocks::new(),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionKey, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire the per-key lock for `channel`/`user`
    ///
    /// Holding the guard serializes every ask invocation for that key. Other
    /// keys are unaffected.
    pub async fn lock(&self, channel: &str, user: &str) -> SessionGuard {
        self.locks.lock(SessionKey::new(channel, user)).await
    }

    /// Return up to the last `max_turns` turns as chat messages
    ///
    /// Each turn expands to a `user` message followed by an `assistant`
    /// message, oldest kept turn first. An absent session yields an empty
    /// vector.
    pub fn get_turns(&self, channel: &str, user: &str, max_turns: usize) -> Vec<Message> {
        let key = SessionKey::new(channel, user);
        let sessions = self.sessions();
        let Some(session) = sessions.get(&key) else {
            return Vec::new();
        };

        let skip = session.turns.len().saturating_sub(max_turns);
        session.turns[skip..]
            .iter()
            .flat_map(|turn| {
                [
                    Message::user(turn.user_message.clone()),
                    Message::assistant(turn.bot_response.clone()),
                ]
            })
            .collect()
    }

    /// Append a turn, creating the session if needed
    ///
    /// No cap is applied here; readers bound the history with `max_turns`.
    pub fn record_turn(
        &self,
        channel: &str,
        user: &str,
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
    ) {
        let key = SessionKey::new(channel, user);
        self.sessions()
            .entry(key)
            .or_insert_with(Session::empty)
            .turns
            .push(Turn {
                user_message: user_message.into(),
                bot_response: bot_response.into(),
            });
    }

    /// Clear the history if the session has been idle longer than the timeout
    ///
    /// Must run before [`SessionStore::touch_activity`] for the same message.
    /// Returns true when history was cleared.
    pub fn reset_if_inactive(&self, channel: &str, user: &str) -> bool {
        let key = SessionKey::new(channel, user);
        let now = self.clock.now();
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(&key) else {
            return false;
        };
        let Some(last_activity) = session.last_activity else {
            return false;
        };

        if now.saturating_duration_since(last_activity) > self.config.idle_timeout {
            tracing::info!(
                channel = %key.channel,
                user = %key.user,
                turns = session.turns.len(),
                "Resetting conversation due to inactivity"
            );
            session.turns.clear();
            return true;
        }
        false
    }

    /// Stamp the session as active now, creating it if needed
    pub fn touch_activity(&self, channel: &str, user: &str) {
        let key = SessionKey::new(channel, user);
        let now = self.clock.now();
        self.sessions()
            .entry(key)
            .or_insert_with(Session::empty)
            .last_activity = Some(now);
    }

    /// Clear the history unconditionally
    ///
    /// Returns true if there was any history to clear.
    pub fn reset_explicit(&self, channel: &str, user: &str) -> bool {
        let key = SessionKey::new(channel, user);
        match self.sessions().get_mut(&key) {
            Some(session) if !session.turns.is_empty() => {
                session.turns.clear();
                tracing::debug!(channel = %key.channel, user = %key.user, "Conversation reset by user");
                true
            }
            _ => false,
        }
    }

    /// Number of stored turns for a key
    pub fn turn_count(&self, channel: &str, user: &str) -> usize {
        self.sessions()
            .get(&SessionKey::new(channel, user))
            .map_or(0, |session| session.turns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_with_clock(idle_secs: u64) -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = SessionStore::new(
            SessionConfig {
                idle_timeout: Duration::from_secs(idle_secs),
            },
            clock.clone(),
        );
        (store, clock)
    }

    #[test]
    fn test_absent_session_has_no_turns() {
        let (store, _) = store_with_clock(120);
        assert!(store.get_turns("#chan", "user", 50).is_empty());
        assert_eq!(store.turn_count("#chan", "user"), 0);
    }

    #[test]
    fn test_get_turns_returns_min_of_recorded_and_requested() {
        let (store, _) = store_with_clock(120);
        for i in 0..5 {
            store.record_turn("chan", "user", format!("q{}", i), format!("a{}", i));
        }

        let all = store.get_turns("chan", "user", 50);
        assert_eq!(all.len(), 10);

        let last_two = store.get_turns("chan", "user", 2);
        assert_eq!(
            last_two,
            vec![
                Message::user("q3"),
                Message::assistant("a3"),
                Message::user("q4"),
                Message::assistant("a4"),
            ]
        );

        assert!(store.get_turns("chan", "user", 0).is_empty());
    }

    #[test]
    fn test_keys_are_normalized() {
        let (store, _) = store_with_clock(120);
        store.record_turn("#RaynnaCS", "Viewer", "hi", "hello");
        assert_eq!(store.turn_count("raynnacs", "viewer"), 1);
    }

    #[test]
    fn test_sessions_are_isolated_per_user_and_channel() {
        let (store, _) = store_with_clock(120);
        store.record_turn("chan", "alice", "q", "a");
        assert_eq!(store.turn_count("chan", "bob"), 0);
        assert_eq!(store.turn_count("other", "alice"), 0);
    }

    #[test]
    fn test_reset_explicit_on_populated_session() {
        let (store, _) = store_with_clock(120);
        store.record_turn("chan", "user", "q", "a");
        assert!(store.reset_explicit("chan", "user"));
        assert!(store.get_turns("chan", "user", 50).is_empty());
        assert!(!store.reset_explicit("chan", "user"));
    }

    #[test]
    fn test_reset_explicit_on_absent_or_touched_session() {
        let (store, _) = store_with_clock(120);
        assert!(!store.reset_explicit("chan", "user"));

        store.touch_activity("chan", "user");
        assert!(!store.reset_explicit("chan", "user"));
    }

    #[test]
    fn test_reset_if_inactive_keeps_session_within_timeout() {
        let (store, clock) = store_with_clock(120);
        store.touch_activity("chan", "user");
        store.record_turn("chan", "user", "q", "a");

        clock.advance(Duration::from_secs(120) - Duration::from_millis(1));
        assert!(!store.reset_if_inactive("chan", "user"));
        assert_eq!(store.turn_count("chan", "user"), 1);
    }

    #[test]
    fn test_reset_if_inactive_boundary_is_exclusive() {
        let (store, clock) = store_with_clock(120);
        store.touch_activity("chan", "user");
        store.record_turn("chan", "user", "q", "a");

        clock.advance(Duration::from_secs(120));
        assert!(!store.reset_if_inactive("chan", "user"));

        clock.advance(Duration::from_millis(1));
        assert!(store.reset_if_inactive("chan", "user"));
        assert_eq!(store.turn_count("chan", "user"), 0);
    }

    #[test]
    fn test_touch_after_check_prevents_self_eviction() {
        let (store, clock) = store_with_clock(120);
        store.touch_activity("chan", "user");
        store.record_turn("chan", "user", "q1", "a1");

        clock.advance(Duration::from_secs(60));
        assert!(!store.reset_if_inactive("chan", "user"));
        store.touch_activity("chan", "user");

        clock.advance(Duration::from_secs(100));
        assert!(!store.reset_if_inactive("chan", "user"));
        assert_eq!(store.turn_count("chan", "user"), 1);
    }

    #[test]
    fn test_reset_if_inactive_without_activity_is_noop() {
        let (store, clock) = store_with_clock(1);
        store.record_turn("chan", "user", "q", "a");
        clock.advance(Duration::from_secs(10));
        assert!(!store.reset_if_inactive("chan", "user"));
        assert!(!store.reset_if_inactive("chan", "nobody"));
    }

    #[tokio::test]
    async fn test_lock_serializes_same_key() {
        let (store, _) = store_with_clock(120);
        let guard = store.lock("chan", "user").await;

        let other_key = tokio::time::timeout(Duration::from_millis(50), store.lock("chan", "other"))
            .await;
        assert!(other_key.is_ok());

        let same_key =
            tokio::time::timeout(Duration::from_millis(50), store.lock("#CHAN", "USER")).await;
        assert!(same_key.is_err());

        drop(guard);
        let same_key =
            tokio::time::timeout(Duration::from_millis(50), store.lock("chan", "user")).await;
        assert!(same_key.is_ok());
    }
}
