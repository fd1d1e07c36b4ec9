// Relay Context - the state shared by producer, consumer and command path

use crate::application::stats::RelayStats;
use crate::domain::{IntervalMinutes, IntervalStore, Link, WorkQueue};
use std::sync::Arc;

/// Handle to the queue, the interval and the counters.
///
/// One instance per relay; clone the `Arc` into each component. Tests build
/// isolated instances instead of sharing process-wide state.
#[derive(Debug, Default)]
pub struct RelayContext {
    queue: WorkQueue,
    interval: IntervalStore,
    stats: RelayStats,
}

impl RelayContext {
    pub fn new(initial_interval: IntervalMinutes) -> Self {
        Self {
            queue: WorkQueue::new(),
            interval: IntervalStore::new(initial_interval),
            stats: RelayStats::new(),
        }
    }

    pub fn shared(initial_interval: IntervalMinutes) -> Arc<Self> {
        Arc::new(Self::new(initial_interval))
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn interval(&self) -> &IntervalStore {
        &self.interval
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Append links to the queue and count them. Returns the new queue length.
    pub fn push_links(&self, links: Vec<Link>) -> usize {
        let count = links.len();
        let len = self.queue.enqueue_all(links);
        self.stats.record_enqueued(count);
        len
    }
}
