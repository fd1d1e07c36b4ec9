// Link Relay Core - Domain Logic & Ports
// NO transport dependencies: chat client, RPC and config live in adapter crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::AppError;
