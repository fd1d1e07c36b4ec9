//! RPC Request/Response Types
//!
//! Parameters and results of the admin/health JSON-RPC methods.

use linkrelay_core::application::DispatcherState;
use serde::{Deserialize, Serialize};

/// Fixed liveness text returned by `health.v1`
pub const HEALTH_TEXT: &str = "Bot is running!";

/// relay.stats.v1 - Queue and dispatcher counters
#[derive(Debug, Default, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub queue_length: usize,
    pub interval_minutes: u64,
    pub dispatcher_state: DispatcherState,
    pub enqueued_total: u64,
    pub sent_total: u64,
    pub failed_total: u64,
    pub empty_cycles: u64,
    pub busy_cycles: u64,
    pub last_sent_at: Option<i64>,
    pub uptime_seconds: u64,
}

/// Interval argument: accepted as a JSON number or string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntervalArg {
    Number(i64),
    Text(String),
}

impl IntervalArg {
    pub fn as_argument(&self) -> String {
        match self {
            IntervalArg::Number(n) => n.to_string(),
            IntervalArg::Text(s) => s.clone(),
        }
    }
}

/// relay.set_interval.v1 - Replace the dispatch interval
#[derive(Debug, Deserialize)]
pub struct SetIntervalRequest {
    pub interval: IntervalArg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetIntervalResponse {
    pub interval_minutes: u64,
    pub message: String,
}

/// relay.enqueue.v1 - Queue links found in free text
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub links: Vec<String>,
    pub queue_length: usize,
}

/// relay.pending.v1 - Ordered view of the queue (head first)
#[derive(Debug, Default, Deserialize)]
pub struct PendingRequest {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    pub links: Vec<String>,
    pub total: usize,
}
