// Work Queue Domain Model

use super::link::Link;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Unbounded FIFO of links waiting to be relayed.
///
/// The lock is held only for a single push, batch append, or pop. Callers
/// must never hold it across an await point, which the API enforces by not
/// handing out guards.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<Link>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one link to the tail. Returns the queue length after the push.
    pub fn enqueue(&self, item: Link) -> usize {
        let mut items = self.lock();
        items.push_back(item);
        items.len()
    }

    /// Append links contiguously, preserving their order.
    pub fn enqueue_all(&self, batch: impl IntoIterator<Item = Link>) -> usize {
        let mut items = self.lock();
        items.extend(batch);
        items.len()
    }

    /// Remove and return the oldest link, or `None` when empty.
    pub fn try_dequeue_one(&self) -> Option<Link> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ordered copy of the pending links (head first)
    pub fn snapshot(&self) -> Vec<Link> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Link>> {
        // A panic while holding the lock cannot leave a VecDeque half-updated
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
