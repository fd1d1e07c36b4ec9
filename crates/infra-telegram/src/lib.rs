// Link Relay Infrastructure - Telegram Bot API
// Implements: MessageSender, UpdateSource; routes updates into the core

pub mod client;
pub mod error;
pub mod poller;
pub mod router;
pub mod types;

pub use client::{TelegramClient, TelegramConfig, UpdateSource};
pub use error::TelegramError;
pub use poller::UpdatePoller;
pub use router::{RouteOutcome, UpdateRouter};
