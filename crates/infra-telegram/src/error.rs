// Telegram adapter errors

use linkrelay_core::port::DeliveryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    /// Network or HTTP-level failure. The request URL (which embeds the bot
    /// token) is stripped before the message is kept.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Bot API error ({code}): {description}")]
    Api { code: i32, description: String },

    #[error("Malformed Bot API response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TelegramError {
    pub(crate) fn http(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TelegramError::Decode(err.without_url().to_string())
        } else {
            TelegramError::Http(err.without_url().to_string())
        }
    }

    /// 401/404 from the Bot API mean the token itself is wrong
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TelegramError::Api { code: 401 | 404, .. })
    }
}

impl From<TelegramError> for DeliveryError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Http(msg) | TelegramError::Config(msg) => DeliveryError::Transport(msg),
            TelegramError::Api { code, description } => {
                DeliveryError::Rejected { code, description }
            }
            TelegramError::Decode(msg) => DeliveryError::InvalidResponse(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, TelegramError>;
