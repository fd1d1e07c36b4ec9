//! Dispatcher - timer-driven consumer of the work queue
//!
//! Each cycle walks `WAITING -> DRAINING -> (IDLE_EMPTY | SENDING) -> WAITING`:
//! sleep for the interval read at the start of the cycle, pop at most one
//! link, deliver it outside the queue lock. Failed deliveries are dropped,
//! never re-queued. Interval changes made during a sleep apply to the next
//! cycle.

use crate::application::context::RelayContext;
use crate::application::shutdown::ShutdownToken;
use crate::application::stats::DispatcherState;
use crate::domain::{ChatId, Link};
use crate::port::{DeliveryError, MessageSender, TimeProvider, Timer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Length of one interval "minute"
pub const MINUTE: Duration = Duration::from_secs(60);

/// Command prepended to every relayed link
pub const DEFAULT_MESSAGE_PREFIX: &str = "/dl";

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Chat that receives relayed links
    pub destination: ChatId,
    /// Prepended to the link with a single space; empty sends the bare link
    pub message_prefix: String,
    /// Wall-clock length of one interval unit
    pub time_unit: Duration,
}

impl DispatcherConfig {
    pub fn new(destination: ChatId) -> Self {
        Self {
            destination,
            message_prefix: DEFAULT_MESSAGE_PREFIX.to_string(),
            time_unit: MINUTE,
        }
    }
}

/// Result of one drain attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was queued
    Empty,
    /// Link popped and delivered
    Sent(Link),
    /// Link popped, delivery failed, link dropped
    Failed { link: Link, error: DeliveryError },
    /// Another drain held the gate; the queue was not touched
    Busy,
}

pub struct Dispatcher {
    context: Arc<RelayContext>,
    sender: Arc<dyn MessageSender>,
    timer: Arc<dyn Timer>,
    time_provider: Arc<dyn TimeProvider>,
    config: DispatcherConfig,
    // Single-flight gate, held for a whole drain including delivery
    drain_gate: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        context: Arc<RelayContext>,
        sender: Arc<dyn MessageSender>,
        timer: Arc<dyn Timer>,
        time_provider: Arc<dyn TimeProvider>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            context,
            sender,
            timer,
            time_provider,
            config,
            drain_gate: Mutex::new(()),
        }
    }

    /// Run until shutdown is requested.
    ///
    /// Shutdown only interrupts the wait; a delivery already in flight is
    /// allowed to finish. Should be spawned in tokio::spawn.
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!(
            destination = %self.config.destination,
            interval_minutes = self.context.interval().current().get(),
            "Dispatcher started"
        );

        while !shutdown.is_shutdown() {
            self.enter(DispatcherState::Waiting);
            let interval = self.context.interval().current();
            let wait = interval.to_duration(self.config.time_unit);
            debug!(
                interval_minutes = interval.get(),
                wait_secs = wait.as_secs(),
                "Waiting for next dispatch cycle"
            );

            tokio::select! {
                _ = self.timer.sleep(wait) => {}
                _ = shutdown.wait() => {
                    info!("Dispatcher interrupted during wait");
                    break;
                }
            }

            self.run_cycle().await;
        }

        self.enter(DispatcherState::Waiting);
        info!(
            pending = self.context.queue().len(),
            "Dispatcher stopped, pending links discarded"
        );
    }

    /// One drain attempt: pop at most one link and deliver it.
    ///
    /// Never fails; delivery errors are logged and reported in the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_gate) = self.drain_gate.try_lock() else {
            warn!("Drain already in progress, skipping cycle");
            self.context.stats().record_busy();
            return CycleOutcome::Busy;
        };

        self.enter(DispatcherState::Draining);
        let Some(link) = self.context.queue().try_dequeue_one() else {
            self.enter(DispatcherState::IdleEmpty);
            self.context.stats().record_empty();
            info!("Queue is empty, waiting for new links");
            self.enter(DispatcherState::Waiting);
            return CycleOutcome::Empty;
        };

        // Queue lock is already released here; producers are never blocked on delivery
        self.enter(DispatcherState::Sending);
        let text = self.format_message(&link);
        let outcome = match self.sender.send(&self.config.destination, &text).await {
            Ok(()) => {
                self.context
                    .stats()
                    .record_sent(self.time_provider.now_millis());
                info!(
                    link = %link,
                    remaining = self.context.queue().len(),
                    "Sent link"
                );
                CycleOutcome::Sent(link)
            }
            Err(e) => {
                self.context.stats().record_failed();
                error!(link = %link, error = %e, "Delivery failed, link dropped");
                CycleOutcome::Failed { link, error: e }
            }
        };

        self.enter(DispatcherState::Waiting);
        outcome
    }

    /// Text delivered for a link
    pub fn format_message(&self, link: &Link) -> String {
        let prefix = self.config.message_prefix.trim();
        if prefix.is_empty() {
            link.to_string()
        } else {
            format!("{prefix} {link}")
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn enter(&self, state: DispatcherState) {
        debug!(state = state.as_str(), "Dispatcher state");
        self.context.stats().set_state(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::IntervalMinutes;
    use crate::port::messenger::mocks::RecordingSender;
    use crate::port::messenger::MockMessageSender;
    use crate::port::time_provider::mocks::{FixedTimeProvider, InstantTimer};
    use crate::port::TokioTimer;
    use async_trait::async_trait;
    use tokio::sync::{oneshot, Notify};

    const DEST: &str = "-1001";

    fn context_with(minutes: u64, links: &[&str]) -> Arc<RelayContext> {
        let context = RelayContext::shared(IntervalMinutes::new(minutes).unwrap());
        context.push_links(links.iter().map(|l| Link::new(*l)).collect());
        context
    }

    fn dispatcher(
        context: &Arc<RelayContext>,
        sender: Arc<dyn MessageSender>,
        timer: Arc<dyn Timer>,
    ) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(context),
            sender,
            timer,
            Arc::new(FixedTimeProvider::new(1_000)),
            DispatcherConfig::new(ChatId::from(DEST)),
        )
    }

    #[tokio::test]
    async fn test_cycle_sends_oldest_first() {
        let context = context_with(1, &["https://terabox.com/a", "https://terabox.com/b"]);
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = dispatcher(&context, sender.clone(), Arc::new(InstantTimer::new()));

        assert_eq!(
            dispatcher.run_cycle().await,
            CycleOutcome::Sent(Link::new("https://terabox.com/a"))
        );
        assert_eq!(context.queue().len(), 1);

        let sent = sender.sent();
        assert_eq!(sent[0].destination, ChatId::from(DEST));
        assert_eq!(sent[0].text, "/dl https://terabox.com/a");

        let stats = context.stats().snapshot();
        assert_eq!(stats.sent_total, 1);
        assert_eq!(stats.last_sent_at, Some(1_000));
        assert_eq!(stats.dispatcher_state, DispatcherState::Waiting);
    }

    #[tokio::test]
    async fn test_empty_queue_never_calls_sender() {
        let context = context_with(1, &[]);
        let mut sender = MockMessageSender::new();
        sender.expect_send().never();
        let dispatcher = dispatcher(&context, Arc::new(sender), Arc::new(InstantTimer::new()));

        assert_eq!(dispatcher.run_cycle().await, CycleOutcome::Empty);
        assert_eq!(dispatcher.run_cycle().await, CycleOutcome::Empty);
        assert_eq!(context.stats().snapshot().empty_cycles, 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_dropped() {
        let context = context_with(1, &["https://terabox.com/a", "https://terabox.com/b"]);
        let sender = Arc::new(RecordingSender::failing(1));
        let dispatcher = dispatcher(&context, sender.clone(), Arc::new(InstantTimer::new()));

        let first = dispatcher.run_cycle().await;
        assert!(matches!(
            first,
            CycleOutcome::Failed { ref link, .. } if link.as_str() == "https://terabox.com/a"
        ));
        // Not re-queued
        assert_eq!(
            context.queue().snapshot(),
            vec![Link::new("https://terabox.com/b")]
        );

        assert_eq!(
            dispatcher.run_cycle().await,
            CycleOutcome::Sent(Link::new("https://terabox.com/b"))
        );
        assert_eq!(sender.attempts(), 2);
        assert_eq!(context.stats().snapshot().failed_total, 1);
    }

    #[tokio::test]
    async fn test_mock_sender_receives_prefixed_text() {
        let context = context_with(1, &["https://terabox.com/z"]);
        let mut sender = MockMessageSender::new();
        sender
            .expect_send()
            .withf(|dest, text| dest.as_str() == DEST && text == "/dl https://terabox.com/z")
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = dispatcher(&context, Arc::new(sender), Arc::new(InstantTimer::new()));

        dispatcher.run_cycle().await;
        assert!(context.queue().is_empty());
    }

    #[test]
    fn test_format_message_prefix() {
        let context = context_with(1, &[]);
        let mut d = dispatcher(
            &context,
            Arc::new(RecordingSender::new()),
            Arc::new(InstantTimer::new()),
        );
        let link = Link::new("https://terabox.com/a");
        assert_eq!(d.format_message(&link), "/dl https://terabox.com/a");

        d.config.message_prefix = "  ".to_string();
        assert_eq!(d.format_message(&link), "https://terabox.com/a");
    }

    /// Parks inside `send` until released
    struct GatedSender {
        entered: Mutex<Option<oneshot::Sender<()>>>,
        release: Notify,
    }

    #[async_trait]
    impl MessageSender for GatedSender {
        async fn send(&self, _: &ChatId, _: &str) -> Result<(), DeliveryError> {
            if let Some(tx) = self.entered.lock().await.take() {
                let _ = tx.send(());
            }
            self.release.notified().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_single_flight_second_drain_is_busy() {
        let context = context_with(1, &["https://terabox.com/a", "https://terabox.com/b"]);
        let (entered_tx, entered_rx) = oneshot::channel();
        let sender = Arc::new(GatedSender {
            entered: Mutex::new(Some(entered_tx)),
            release: Notify::new(),
        });
        let dispatcher = Arc::new(dispatcher(
            &context,
            sender.clone(),
            Arc::new(InstantTimer::new()),
        ));

        let first = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.run_cycle().await }
        });
        entered_rx.await.unwrap();
        assert_eq!(context.stats().state(), DispatcherState::Sending);

        // First drain is parked in delivery, holding the gate
        assert_eq!(dispatcher.run_cycle().await, CycleOutcome::Busy);
        assert_eq!(context.queue().len(), 1);

        // Producers are not blocked while delivery is in flight
        context.push_links(vec![Link::new("https://terabox.com/c")]);
        assert_eq!(context.queue().len(), 2);

        sender.release.notify_one();
        assert_eq!(
            first.await.unwrap(),
            CycleOutcome::Sent(Link::new("https://terabox.com/a"))
        );
        assert_eq!(context.stats().snapshot().busy_cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_send_per_interval_window() {
        let context = context_with(1, &["https://terabox.com/a"]);
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = Arc::new(dispatcher(&context, sender.clone(), Arc::new(TokioTimer)));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.run(token).await }
        });

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(sender.attempts(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sender.texts(), vec!["/dl https://terabox.com/a"]);
        assert!(context.queue().is_empty());

        // Next window finds an empty queue
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(sender.attempts(), 1);
        assert_eq!(context.stats().snapshot().empty_cycles, 1);

        tx.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_applies_to_next_cycle() {
        let context = context_with(1, &["https://terabox.com/a", "https://terabox.com/b"]);
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = Arc::new(dispatcher(&context, sender.clone(), Arc::new(TokioTimer)));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.run(token).await }
        });

        // Change mid-sleep: the running 1-minute wait is not stretched
        tokio::time::sleep(Duration::from_secs(30)).await;
        context.interval().replace(IntervalMinutes::new(2).unwrap());

        tokio::time::sleep(Duration::from_secs(31)).await; // t = 61s
        assert_eq!(sender.attempts(), 1);

        tokio::time::sleep(Duration::from_secs(118)).await; // t = 179s
        assert_eq!(sender.attempts(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await; // t = 181s
        assert_eq!(sender.attempts(), 2);

        tx.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_reads_interval_each_cycle() {
        let context = context_with(3, &["https://terabox.com/a", "https://terabox.com/b"]);
        let sender = Arc::new(RecordingSender::new());
        let timer = Arc::new(InstantTimer::new());
        let dispatcher = Arc::new(dispatcher(&context, sender.clone(), timer.clone()));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.run(token).await }
        });

        while sender.attempts() < 1 {
            tokio::task::yield_now().await;
        }
        context.interval().replace(IntervalMinutes::new(5).unwrap());
        while !timer.requested().contains(&Duration::from_secs(300)) {
            tokio::task::yield_now().await;
        }
        tx.shutdown();
        handle.await.unwrap();

        let requested = timer.requested();
        assert_eq!(requested[0], Duration::from_secs(180));
        assert!(requested.contains(&Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let context = context_with(1, &["https://terabox.com/a"]);
        let sender = Arc::new(RecordingSender::new());
        let dispatcher = dispatcher(&context, sender.clone(), Arc::new(TokioTimer));
        let (tx, token) = shutdown_channel();
        tx.shutdown();

        dispatcher.run(token).await;
        assert_eq!(sender.attempts(), 0);
        assert_eq!(context.queue().len(), 1);
    }
}
