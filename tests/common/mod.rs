use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use raynna_bot::ask::AskCommand;
use raynna_bot::bot::Bot;
use raynna_bot::chat::FakeChatClient;
use raynna_bot::clock::ManualClock;
use raynna_bot::config::{AskConfig, RateLimitConfig};
use raynna_bot::error::{BotError, Result};
use raynna_bot::messaging::MessageSender;
use raynna_bot::providers::{CompletionRequest, CompletionResponse, Message, Provider};
use raynna_bot::ratelimit::RateLimiter;
use raynna_bot::session::{SessionConfig, SessionStore};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Replays queued replies; answers `reply N` once the queue is empty
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        let provider = Self::default();
        provider
            .replies
            .lock()
            .unwrap()
            .push_back(Err(BotError::Generation(message.to_string()).into()));
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => format!("reply {}", call),
        };
        Ok(CompletionResponse::new(Message::assistant(text)))
    }
}

/// A fully wired bot on a manual clock
#[allow(dead_code)]
pub struct Harness {
    pub bot: Arc<Bot>,
    pub chat: Arc<FakeChatClient>,
    pub provider: Arc<ScriptedProvider>,
    pub sessions: Arc<SessionStore>,
    pub clock: Arc<ManualClock>,
}

#[allow(dead_code)]
pub fn harness(provider: ScriptedProvider, chat: FakeChatClient) -> Harness {
    harness_with(provider, chat, RateLimitConfig::default(), None)
}

#[allow(dead_code)]
pub fn harness_with(
    provider: ScriptedProvider,
    chat: FakeChatClient,
    rate_limit: RateLimitConfig,
    creator_channel: Option<&str>,
) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let provider = Arc::new(provider);
    let chat = Arc::new(chat);
    let ask_config = AskConfig::default();

    let sessions = Arc::new(SessionStore::new(
        SessionConfig {
            idle_timeout: ask_config.idle_timeout(),
        },
        clock.clone(),
    ));
    let ask = Arc::new(AskCommand::new(
        provider.clone(),
        sessions.clone(),
        ask_config,
    ));
    let limiter = Arc::new(RateLimiter::new(rate_limit, clock.clone()));
    let sender = Arc::new(MessageSender::new(
        chat.clone(),
        limiter,
        creator_channel.map(str::to_string),
    ));

    Harness {
        bot: Arc::new(Bot::new("raynna_bot", "!", ask, sender)),
        chat,
        provider,
        sessions,
        clock,
    }
}
