// Message Sender Port
// Abstraction over the chat platform's outbound send call

use crate::domain::ChatId;
use async_trait::async_trait;
use thiserror::Error;

/// Delivery errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Rejected by platform ({code}): {description}")]
    Rejected { code: i32, description: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Outbound send call
///
/// Implementations:
/// - TelegramClient: Bot API `sendMessage`
/// - mocks::RecordingSender: captures sends in memory (tests)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `text` to `destination`. No retry is owed by implementations.
    async fn send(&self, destination: &ChatId, text: &str) -> Result<(), DeliveryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A captured send call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub destination: ChatId,
        pub text: String,
    }

    /// Records every send; optionally fails a scripted number of calls first
    #[derive(Default)]
    pub struct RecordingSender {
        sent: Mutex<Vec<SentMessage>>,
        failures: Mutex<VecDeque<DeliveryError>>,
        attempts: Mutex<usize>,
    }

    impl RecordingSender {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the next `n` sends with a transport error
        pub fn failing(n: usize) -> Self {
            let sender = Self::default();
            {
                let mut failures = sender.failures.lock().unwrap();
                for i in 0..n {
                    failures.push_back(DeliveryError::Transport(format!("scripted failure {i}")));
                }
            }
            sender
        }

        /// Successful sends, in order
        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }

        pub fn texts(&self) -> Vec<String> {
            self.sent().into_iter().map(|m| m.text).collect()
        }

        /// All send calls, including failed ones
        pub fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, destination: &ChatId, text: &str) -> Result<(), DeliveryError> {
            *self.attempts.lock().unwrap() += 1;

            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }

            self.sent.lock().unwrap().push(SentMessage {
                destination: destination.clone(),
                text: text.to_string(),
            });
            Ok(())
        }
    }
}
