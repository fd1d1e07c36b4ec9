// Long-poll loop: fetch updates, advance the offset, hand each update to the router

use crate::client::UpdateSource;
use crate::router::UpdateRouter;
use linkrelay_core::application::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Pause after a failed `getUpdates` before polling again (5s)
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct UpdatePoller {
    source: Arc<dyn UpdateSource>,
    router: Arc<UpdateRouter>,
    backoff: Duration,
}

impl UpdatePoller {
    pub fn new(source: Arc<dyn UpdateSource>, router: Arc<UpdateRouter>) -> Self {
        Self {
            source,
            router,
            backoff: ERROR_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Poll until shutdown. Updates are routed one at a time, in order.
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!("Update poller started");
        let mut offset: Option<i64> = None;

        while !shutdown.is_shutdown() {
            let batch = tokio::select! {
                res = self.source.fetch_updates(offset) => res,
                _ = shutdown.wait() => break,
            };

            match batch {
                Ok(updates) => {
                    for update in updates {
                        // Acknowledge before routing so a crashing update is not redelivered forever
                        offset = Some(update.update_id + 1);
                        self.router.route(update).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, backoff_secs = self.backoff.as_secs(), "getUpdates failed");
                    tokio::select! {
                        _ = sleep(self.backoff) => {}
                        _ = shutdown.wait() => break,
                    }
                }
            }
        }

        info!("Update poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, TelegramError};
    use crate::types::Update;
    use async_trait::async_trait;
    use linkrelay_core::application::{
        shutdown_channel, IngestionConfig, IngestionListener, IntervalCommandHandler, RelayContext,
        ShutdownSender,
    };
    use linkrelay_core::domain::{IntervalMinutes, LinkExtractor};
    use linkrelay_core::port::messenger::mocks::RecordingSender;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted batches, records offsets, then triggers shutdown
    struct ScriptedSource {
        batches: Mutex<VecDeque<Result<Vec<Update>>>>,
        offsets: Mutex<Vec<Option<i64>>>,
        stop: ShutdownSender,
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn fetch_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
            self.offsets.lock().unwrap().push(offset);
            let next = self.batches.lock().unwrap().pop_front();
            match next {
                Some(batch) => batch,
                None => {
                    self.stop.shutdown();
                    Ok(Vec::new())
                }
            }
        }
    }

    fn post(update_id: i64, text: &str) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": update_id,
            "channel_post": {
                "message_id": update_id,
                "chat": {"id": -100, "type": "channel"},
                "text": text
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_offsets_advance_and_errors_back_off() {
        let context = RelayContext::shared(IntervalMinutes::default());
        let sender = Arc::new(RecordingSender::new());
        let router = Arc::new(UpdateRouter::new(
            Arc::new(IngestionListener::new(
                Arc::clone(&context),
                LinkExtractor::default(),
                sender.clone(),
                IngestionConfig::default(),
            )),
            Arc::new(IntervalCommandHandler::new(Arc::clone(&context))),
            sender,
        ));

        let (stop, token) = shutdown_channel();
        let source = Arc::new(ScriptedSource {
            batches: Mutex::new(VecDeque::from(vec![
                Ok(vec![
                    post(100, "https://terabox.com/a"),
                    post(101, "no links"),
                ]),
                Err(TelegramError::Http("connection reset".into())),
                Ok(vec![post(102, "https://terabox.com/b")]),
            ])),
            offsets: Mutex::new(Vec::new()),
            stop,
        });

        let poller = UpdatePoller::new(source.clone(), router).with_backoff(Duration::from_millis(1));
        tokio::time::timeout(Duration::from_secs(5), poller.run(token))
            .await
            .expect("poller should stop once the script is exhausted");

        assert_eq!(
            *source.offsets.lock().unwrap(),
            vec![None, Some(102), Some(102), Some(103)]
        );
        assert_eq!(context.queue().len(), 2);
    }
}
