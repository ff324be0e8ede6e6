//! Twitch chat over IRC
//!
//! [`TwitchIrcClient::connect`] opens a plain TCP connection to the Twitch
//! IRC endpoint, authenticates, requests the tags and commands capabilities
//! and joins the configured channels. Two background Tokio tasks are started:
//!
//! 1. A writer that drains an unbounded channel of outbound lines onto the
//!    socket, appending CRLF.
//! 2. A reader that parses every inbound line, answers `PING`, records the
//!    bot's own badges from `USERSTATE` and forwards `PRIVMSG` lines as
//!    [`ChatMessage`]s.
//!
//! The inbound receiver closes when the server closes the connection.

use crate::chat::irc::{parse_line, IrcLine};
use crate::chat::{is_privileged_badge_set, normalize_channel, ChatClient, ChatMessage};
use crate::config::ChatConfig;
use crate::error::{BotError, Result};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

type BadgeMap = HashMap<String, HashMap<String, String>>;

/// IRC-backed [`ChatClient`]
#[derive(Debug, Clone)]
pub struct TwitchIrcClient {
    username: String,
    outbound_tx: mpsc::UnboundedSender<String>,
    bot_badges: Arc<Mutex<BadgeMap>>,
}

/// What a parsed line means to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
enum IrcEvent {
    Ping(String),
    Message(ChatMessage),
    UserState {
        channel: String,
        badges: HashMap<String, String>,
    },
    Notice(String),
    Reconnect,
    Other,
}

impl TwitchIrcClient {
    /// Connect, authenticate and join channels
    ///
    /// # Returns
    ///
    /// The client plus a receiver of inbound chat messages.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Chat`] if the TCP connection cannot be opened and
    /// [`BotError::MissingCredentials`] if no OAuth token is configured.
    pub async fn connect(
        config: &ChatConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChatMessage>)> {
        let token = config
            .oauth_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BotError::MissingCredentials("twitch".to_string()))?;

        let stream = TcpStream::connect(&config.server).await.map_err(|e| {
            BotError::Chat(format!("failed to connect to {}: {}", config.server, e))
        })?;
        let (read_half, write_half) = stream.into_split();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<ChatMessage>();
        let bot_badges = Arc::new(Mutex::new(BadgeMap::new()));
        let username = config.username.to_lowercase();

        tokio::spawn(write_loop(write_half, outbound_rx));
        tokio::spawn(read_loop(
            read_half,
            outbound_tx.clone(),
            inbound_tx,
            bot_badges.clone(),
        ));

        let client = Self {
            username,
            outbound_tx,
            bot_badges,
        };

        client.queue("CAP REQ :twitch.tv/tags twitch.tv/commands".to_string())?;
        client.queue(format!("PASS {}", oauth_password(token)))?;
        client.queue(format!("NICK {}", client.username))?;
        for channel in &config.channels {
            client.join(channel)?;
        }

        tracing::info!(
            server = %config.server,
            username = %client.username,
            channels = config.channels.len(),
            "Connected to Twitch chat"
        );

        Ok((client, inbound_rx))
    }

    /// Join an additional channel
    pub fn join(&self, channel: &str) -> Result<()> {
        let channel = normalize_channel(channel);
        tracing::info!(channel = %channel, "Joining channel");
        self.queue(format!("JOIN #{}", channel))
    }

    /// Bot login name
    pub fn username(&self) -> &str {
        &self.username
    }

    fn queue(&self, line: String) -> Result<()> {
        self.outbound_tx
            .send(line)
            .map_err(|_| BotError::Chat("connection writer has shut down".to_string()).into())
    }
}

#[async_trait]
impl ChatClient for TwitchIrcClient {
    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        let channel = normalize_channel(channel);
        let text: String = text
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();
        self.queue(format!("PRIVMSG #{} :{}", channel, text))
    }

    async fn is_elevated(&self, channel: &str) -> Result<bool> {
        let channel = normalize_channel(channel);
        if channel == self.username {
            return Ok(true);
        }
        let badges = self.bot_badges.lock().unwrap_or_else(|e| e.into_inner());
        badges
            .get(&channel)
            .map(is_privileged_badge_set)
            .ok_or_else(|| {
                BotError::Lookup(format!("no USERSTATE received for #{}", channel)).into()
            })
    }
}

fn oauth_password(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("oauth:") {
        token.to_string()
    } else {
        format!("oauth:{}", token)
    }
}

async fn write_loop(mut writer: OwnedWriteHalf, mut outbound_rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outbound_rx.recv().await {
        if line.starts_with("PASS ") {
            tracing::debug!("> PASS ***");
        } else {
            tracing::debug!("> {}", line);
        }
        let framed = format!("{}\r\n", line);
        if let Err(e) = writer.write_all(framed.as_bytes()).await {
            tracing::error!("Failed to write to chat connection: {}", e);
            break;
        }
    }
    tracing::debug!("Chat writer task finished");
}

async fn read_loop(
    reader: OwnedReadHalf,
    outbound_tx: mpsc::UnboundedSender<String>,
    inbound_tx: mpsc::UnboundedSender<ChatMessage>,
    bot_badges: Arc<Mutex<BadgeMap>>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                tracing::warn!("Chat connection closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to read from chat connection: {}", e);
                break;
            }
        }

        // Invalid UTF-8 is replaced, never fatal to the connection
        let raw = String::from_utf8_lossy(&buf);
        let raw = raw.trim_end_matches(['\r', '\n']);
        tracing::trace!("< {}", raw);

        let Some(line) = parse_line(raw) else {
            continue;
        };

        match classify(line) {
            IrcEvent::Ping(payload) => {
                let _ = outbound_tx.send(format!("PONG :{}", payload));
            }
            IrcEvent::Message(message) => {
                if inbound_tx.send(message).is_err() {
                    tracing::debug!("Inbound receiver dropped; stopping reader");
                    break;
                }
            }
            IrcEvent::UserState { channel, badges } => {
                tracing::debug!(channel = %channel, ?badges, "Bot USERSTATE updated");
                bot_badges
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(channel, badges);
            }
            IrcEvent::Notice(text) => {
                if text.contains("authentication failed")
                    || text.contains("Improperly formatted auth")
                {
                    tracing::error!("Twitch rejected login: {}", text);
                } else {
                    tracing::info!("Twitch notice: {}", text);
                }
            }
            IrcEvent::Reconnect => {
                tracing::warn!("Twitch requested a reconnect");
            }
            IrcEvent::Other => {}
        }
    }
}

fn classify(line: IrcLine) -> IrcEvent {
    match line.command.as_str() {
        "PING" => IrcEvent::Ping(line.params.last().cloned().unwrap_or_default()),
        "PRIVMSG" if line.params.len() >= 2 => {
            let username = line.nick().unwrap_or_default().to_lowercase();
            let display_name = line
                .tag("display-name")
                .map(str::to_string)
                .unwrap_or_else(|| username.clone());
            IrcEvent::Message(ChatMessage {
                channel: normalize_channel(&line.params[0]),
                badges: line.badges(),
                username,
                display_name,
                text: line.params[1].clone(),
            })
        }
        "USERSTATE" if !line.params.is_empty() => IrcEvent::UserState {
            channel: normalize_channel(&line.params[0]),
            badges: line.badges(),
        },
        "NOTICE" => IrcEvent::Notice(line.params.last().cloned().unwrap_or_default()),
        "RECONNECT" => IrcEvent::Reconnect,
        _ => IrcEvent::Other,
    }
}
