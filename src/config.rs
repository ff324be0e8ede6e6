//! Configuration management for the bot
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{BotError, Result};
use crate::providers::PROVIDER_TYPES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Twitch chat connection
    #[serde(default)]
    pub chat: ChatConfig,
    /// Text-generation provider
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Ask command behavior
    #[serde(default)]
    pub ask: AskConfig,
    /// Outbound message rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Twitch chat connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// IRC server address (host:port)
    #[serde(default = "default_server")]
    pub server: String,

    /// Bot login name
    #[serde(default)]
    pub username: String,

    /// OAuth token, with or without the `oauth:` prefix
    #[serde(default)]
    pub oauth_token: Option<String>,

    /// Channels to join on connect
    #[serde(default)]
    pub channels: Vec<String>,

    /// Owner channel; granted the privileged send allowance
    #[serde(default)]
    pub creator_channel: Option<String>,

    /// Prefix that marks a chat line as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_server() -> String {
    "irc.chat.twitch.tv:6667".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            username: String::new(),
            oauth_token: None,
            channels: Vec::new(),
            creator_channel: None,
            command_prefix: default_command_prefix(),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("openai" or "ollama")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// HTTP timeout for a single generation request (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,

    /// OpenAI configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "openai".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            timeout_seconds: default_provider_timeout(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL (useful for tests and compatible gateways)
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// API key; usually supplied through the environment
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_openai_model")]
    pub model: String,
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "chatgpt-4o-latest".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            api_key: None,
            model: default_openai_model(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Ask command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskConfig {
    /// Chat triggers that invoke the command (without prefix)
    #[serde(default = "default_triggers")]
    pub triggers: Vec<String>,

    /// Username the bot acknowledges as its creator
    #[serde(default = "default_creator")]
    pub creator: String,

    /// Idle time after which a conversation is forgotten (seconds)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Number of prior turns sent as context
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    /// Character budget stated in the system instruction
    #[serde(default = "default_prompt_char_limit")]
    pub prompt_char_limit: usize,

    /// Hard cap on the reply length in characters
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    /// Maximum tokens the provider may generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Standard sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Temperature used when a creative keyword matches
    #[serde(default = "default_creative_temperature")]
    pub creative_temperature: f32,

    /// Keywords that mark a request as random/creative
    #[serde(default = "default_creative_keywords")]
    pub creative_keywords: Vec<String>,

    /// Regenerations allowed when an answer repeats an earlier one
    #[serde(default = "default_max_regenerate_attempts")]
    pub max_regenerate_attempts: usize,

    /// Upper bound on one generation call including network time (seconds)
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_seconds: u64,
}

fn default_triggers() -> Vec<String> {
    [
        "ask",
        "question",
        "heybot",
        "hibot",
        "hellobot",
        "hiraynna",
        "heyraynna",
        "helloraynna",
        "supbot",
        "sup",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_creator() -> String {
    "RaynnaCS".to_string()
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_max_history_turns() -> usize {
    50
}

fn default_prompt_char_limit() -> usize {
    200
}

fn default_max_reply_chars() -> usize {
    250
}

fn default_max_output_tokens() -> u32 {
    70
}

fn default_temperature() -> f32 {
    0.6
}

fn default_creative_temperature() -> f32 {
    1.0
}

fn default_creative_keywords() -> Vec<String> {
    ["random", "joke", "slumpad", "slump"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_regenerate_attempts() -> usize {
    5
}

fn default_generation_timeout() -> u64 {
    30
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            triggers: default_triggers(),
            creator: default_creator(),
            idle_timeout_seconds: default_idle_timeout(),
            max_history_turns: default_max_history_turns(),
            prompt_char_limit: default_prompt_char_limit(),
            max_reply_chars: default_max_reply_chars(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            creative_temperature: default_creative_temperature(),
            creative_keywords: default_creative_keywords(),
            max_regenerate_attempts: default_max_regenerate_attempts(),
            generation_timeout_seconds: default_generation_timeout(),
        }
    }
}

impl AskConfig {
    /// Idle timeout as a [`Duration`]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Generation timeout as a [`Duration`]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_seconds)
    }
}

/// Whether rate windows are shared by all channels or kept per channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One window per channel
    #[default]
    PerChannel,
    /// One window shared by every channel
    Global,
}

/// Outbound rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Fixed window length (seconds)
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Messages per window for ordinary channels
    #[serde(default = "default_standard_limit")]
    pub standard_limit: u32,

    /// Messages per window for the creator channel or when the bot is mod/VIP
    #[serde(default = "default_privileged_limit")]
    pub privileged_limit: u32,

    /// Window keying
    #[serde(default)]
    pub scope: RateLimitScope,
}

fn default_window_seconds() -> u64 {
    30
}

fn default_standard_limit() -> u32 {
    20
}

fn default_privileged_limit() -> u32 {
    100
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            standard_limit: default_standard_limit(),
            privileged_limit: default_privileged_limit(),
            scope: RateLimitScope::default(),
        }
    }
}

impl RateLimitConfig {
    /// Window length as a [`Duration`]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BotError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        // Chat overrides
        if let Ok(username) = std::env::var("RAYNNA_TWITCH_USERNAME") {
            self.chat.username = username;
        }

        if let Ok(token) = std::env::var("RAYNNA_TWITCH_OAUTH_TOKEN") {
            self.chat.oauth_token = Some(token);
        }

        if let Ok(channels) = std::env::var("RAYNNA_TWITCH_CHANNELS") {
            let channels: Vec<String> = channels
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !channels.is_empty() {
                tracing::debug!(?channels, "Env override: RAYNNA_TWITCH_CHANNELS");
                self.chat.channels = channels;
            }
        }

        if let Ok(creator_channel) = std::env::var("RAYNNA_CREATOR_CHANNEL") {
            self.chat.creator_channel = Some(creator_channel);
        }

        // Provider overrides
        if let Ok(provider_type) = std::env::var("RAYNNA_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_key) = std::env::var("RAYNNA_OPENAI_KEY") {
            self.provider.openai.api_key = Some(api_key);
        } else if self.provider.openai.api_key.is_none() {
            if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
                self.provider.openai.api_key = Some(api_key);
            }
        }

        if let Ok(model) = std::env::var("RAYNNA_OPENAI_MODEL") {
            self.provider.openai.model = model;
        }

        if let Ok(host) = std::env::var("RAYNNA_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        // Ask overrides
        if let Ok(timeout) = std::env::var("RAYNNA_IDLE_TIMEOUT_SECONDS") {
            match timeout.parse() {
                Ok(value) => self.ask.idle_timeout_seconds = value,
                Err(_) => tracing::warn!("Invalid RAYNNA_IDLE_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(max_chars) = std::env::var("RAYNNA_MAX_REPLY_CHARS") {
            match max_chars.parse() {
                Ok(value) => self.ask.max_reply_chars = value,
                Err(_) => tracing::warn!("Invalid RAYNNA_MAX_REPLY_CHARS: {}", max_chars),
            }
        }

        // Rate limit overrides
        if let Ok(scope) = std::env::var("RAYNNA_RATE_LIMIT_SCOPE") {
            self.rate_limit.scope = match scope.to_lowercase().as_str() {
                "per_channel" => RateLimitScope::PerChannel,
                "global" => RateLimitScope::Global,
                _ => {
                    tracing::warn!("Invalid rate limit scope: {}, using default", scope);
                    RateLimitScope::default()
                }
            };
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(provider) = &cli.provider {
            self.provider.provider_type = provider.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Chat credentials are not checked here because the one-shot `ask`
    /// subcommand runs without a chat connection; see
    /// [`Config::validate_chat`].
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if !PROVIDER_TYPES.contains(&self.provider.provider_type.as_str()) {
            return Err(BotError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                PROVIDER_TYPES.join(", ")
            ))
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(BotError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ask.triggers.iter().all(|t| t.trim().is_empty()) {
            return Err(
                BotError::Config("ask.triggers must contain at least one trigger".to_string())
                    .into(),
            );
        }

        if self.ask.max_reply_chars == 0 {
            return Err(
                BotError::Config("ask.max_reply_chars must be greater than 0".to_string()).into(),
            );
        }

        if self.ask.max_output_tokens == 0 {
            return Err(BotError::Config(
                "ask.max_output_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ask.generation_timeout_seconds == 0 {
            return Err(BotError::Config(
                "ask.generation_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, value) in [
            ("ask.temperature", self.ask.temperature),
            ("ask.creative_temperature", self.ask.creative_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(
                    BotError::Config(format!("{} must be between 0.0 and 2.0", name)).into(),
                );
            }
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(BotError::Config(
                "rate_limit.window_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.rate_limit.standard_limit == 0 {
            return Err(BotError::Config(
                "rate_limit.standard_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.rate_limit.privileged_limit < self.rate_limit.standard_limit {
            return Err(BotError::Config(
                "rate_limit.privileged_limit must be at least rate_limit.standard_limit"
                    .to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Validate the settings needed to connect to chat
    ///
    /// # Errors
    ///
    /// Returns error when the username, token or channel list is missing
    pub fn validate_chat(&self) -> Result<()> {
        if self.chat.username.trim().is_empty() {
            return Err(BotError::Config("chat.username cannot be empty".to_string()).into());
        }

        if self
            .chat
            .oauth_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
        {
            return Err(BotError::MissingCredentials("twitch".to_string()).into());
        }

        if self.chat.channels.is_empty() {
            return Err(BotError::Config(
                "chat.channels must list at least one channel".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
