// Inbound Message Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat identifier as understood by the messaging platform.
///
/// Kept as a string so both numeric ids (`-1001234567890`) and public
/// usernames (`@my_channel`) round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an inbound message was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Post published in a channel
    ChannelPost,
    /// Message in a group or private chat
    Message,
}

/// Transport-neutral view of an inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl InboundMessage {
    pub fn channel_post(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            kind: MessageKind::ChannelPost,
            text: Some(text.into()),
            caption: None,
        }
    }

    /// Body to scan for links: caption wins over text, blanks count as absent
    pub fn body(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.text.as_deref().filter(|t| !t.is_empty()))
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_preferred_over_text() {
        let msg = InboundMessage {
            chat_id: ChatId::from(-100_i64),
            kind: MessageKind::ChannelPost,
            text: Some("text".into()),
            caption: Some("caption".into()),
        };
        assert_eq!(msg.body(), Some("caption"));
    }

    #[test]
    fn test_empty_caption_falls_back_to_text() {
        let msg = InboundMessage {
            chat_id: ChatId::from(1_i64),
            kind: MessageKind::Message,
            text: Some("text".into()),
            caption: Some(String::new()),
        };
        assert_eq!(msg.body(), Some("text"));
    }

    #[test]
    fn test_no_body() {
        let msg = InboundMessage {
            chat_id: ChatId::from("@chan"),
            kind: MessageKind::ChannelPost,
            text: None,
            caption: None,
        };
        assert_eq!(msg.body(), None);
        assert_eq!(msg.chat_id.as_str(), "@chan");
    }
}
