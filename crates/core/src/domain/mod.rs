// Domain Layer - Pure relay logic and entities

pub mod error;
pub mod interval;
pub mod link;
pub mod message;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use interval::{IntervalMinutes, IntervalStore, DEFAULT_INTERVAL_MINUTES};
pub use link::{Link, LinkExtractor, DEFAULT_ACCEPTED_HOSTS};
pub use message::{ChatId, InboundMessage, MessageKind};
pub use queue::WorkQueue;
