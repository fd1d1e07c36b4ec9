// Telegram Bot API client
// getMe / getUpdates / sendMessage over HTTPS JSON

use crate::error::{Result, TelegramError};
use crate::types::{ApiResponse, GetUpdatesParams, Message, SendMessageParams, Update, User};
use async_trait::async_trait;
use linkrelay_core::domain::ChatId;
use linkrelay_core::port::{DeliveryError, MessageSender};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout passed to `getUpdates` (seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Extra time on top of the long-poll timeout before the HTTP request gives up
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Update kinds the relay subscribes to
const ALLOWED_UPDATES: &[&str] = &["message", "channel_post"];

/// Client settings
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base: String,
    pub poll_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// Source of inbound updates (the Bot API in production, scripted in tests)
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>>;
}

pub struct TelegramClient {
    http: reqwest::Client,
    // "{api_base}/bot{token}", never logged
    endpoint: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = config.bot_token.trim();
        if token.is_empty() {
            return Err(TelegramError::Config("bot token is empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs) + REQUEST_TIMEOUT_MARGIN)
            .build()
            .map_err(TelegramError::http)?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// `getMe` - verifies the token
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// `getUpdates` long poll starting at `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &params).await
    }

    /// `sendMessage` with link previews disabled
    pub async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<Message> {
        let params = SendMessageParams {
            chat_id: chat_id.as_str(),
            text,
            disable_web_page_preview: true,
        };
        self.call("sendMessage", &params).await
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(method = method, "Bot API call");

        // Error statuses still carry the JSON envelope, so the body is parsed regardless
        let response: ApiResponse<R> = self
            .http
            .post(format!("{}/{}", self.endpoint, method))
            .json(params)
            .send()
            .await
            .map_err(TelegramError::http)?
            .json()
            .await
            .map_err(TelegramError::http)?;

        response.into_result()
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, destination: &ChatId, text: &str) -> std::result::Result<(), DeliveryError> {
        self.send_message(destination, text)
            .await
            .map(|_| ())
            .map_err(DeliveryError::from)
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        self.get_updates(offset).await
    }
}
