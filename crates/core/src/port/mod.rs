// Port Layer - Interfaces for external dependencies

pub mod messenger;
pub mod time_provider; // Also hosts the Timer port

// Re-exports
pub use messenger::{DeliveryError, MessageSender};
pub use time_provider::{SystemTimeProvider, TimeProvider, Timer, TokioTimer};
