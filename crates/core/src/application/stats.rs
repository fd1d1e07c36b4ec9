// Relay Counters
// Lock-free counters read by the status command and the admin RPC

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

/// Dispatcher state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatcherState {
    /// Sleeping for the current interval
    Waiting,
    /// Acquiring single-flight access to the queue
    Draining,
    /// Queue was empty this cycle
    IdleEmpty,
    /// Delivering the popped link
    Sending,
}

impl DispatcherState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatcherState::Waiting => "WAITING",
            DispatcherState::Draining => "DRAINING",
            DispatcherState::IdleEmpty => "IDLE_EMPTY",
            DispatcherState::Sending => "SENDING",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            DispatcherState::Waiting => 0,
            DispatcherState::Draining => 1,
            DispatcherState::IdleEmpty => 2,
            DispatcherState::Sending => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => DispatcherState::Draining,
            2 => DispatcherState::IdleEmpty,
            3 => DispatcherState::Sending,
            _ => DispatcherState::Waiting,
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub enqueued_total: u64,
    pub sent_total: u64,
    pub failed_total: u64,
    pub empty_cycles: u64,
    pub busy_cycles: u64,
    pub last_sent_at: Option<i64>,
    pub dispatcher_state: DispatcherState,
}

#[derive(Debug, Default)]
pub struct RelayStats {
    enqueued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    empty_cycles: AtomicU64,
    busy_cycles: AtomicU64,
    last_sent_at: AtomicI64, // 0 = never
    state: AtomicU8,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self, count: usize) {
        self.enqueued.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_sent(&self, at_millis: i64) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.last_sent_at.store(at_millis, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty(&self) {
        self.empty_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_busy(&self) {
        self.busy_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_state(&self, state: DispatcherState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let last = self.last_sent_at.load(Ordering::Relaxed);
        StatsSnapshot {
            enqueued_total: self.enqueued.load(Ordering::Relaxed),
            sent_total: self.sent.load(Ordering::Relaxed),
            failed_total: self.failed.load(Ordering::Relaxed),
            empty_cycles: self.empty_cycles.load(Ordering::Relaxed),
            busy_cycles: self.busy_cycles.load(Ordering::Relaxed),
            last_sent_at: (last != 0).then_some(last),
            dispatcher_state: self.state(),
        }
    }
}
