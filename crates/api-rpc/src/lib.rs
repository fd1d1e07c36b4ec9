//! JSON-RPC Admin API
//!
//! Health probe and operator methods for a running relay: counters, queue
//! inspection, manual enqueue, interval changes.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
