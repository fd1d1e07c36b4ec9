// Ingestion Listener - inbound message -> extractor -> work queue

use crate::application::context::RelayContext;
use crate::domain::{InboundMessage, Link, LinkExtractor, MessageKind};
use crate::port::MessageSender;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ingestion behaviour switches
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Reply to the source chat after each processed message
    pub acknowledge: bool,
    /// Ignore everything except channel posts
    pub channel_posts_only: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            acknowledge: false,
            channel_posts_only: true,
        }
    }
}

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Filtered out or carried neither text nor caption
    Ignored,
    /// Had a body, but no accepted links
    NoMatch,
    /// Links appended to the queue
    Queued { count: usize, queue_len: usize },
}

/// Producer side of the relay.
///
/// Stateless apart from the shared context, so any number of messages can be
/// handled concurrently.
pub struct IngestionListener {
    context: Arc<RelayContext>,
    extractor: LinkExtractor,
    sender: Arc<dyn MessageSender>,
    config: IngestionConfig,
}

impl IngestionListener {
    pub fn new(
        context: Arc<RelayContext>,
        extractor: LinkExtractor,
        sender: Arc<dyn MessageSender>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            context,
            extractor,
            sender,
            config,
        }
    }

    /// Handle one inbound message event
    pub async fn on_message(&self, message: &InboundMessage) -> IngestOutcome {
        if self.config.channel_posts_only && message.kind != MessageKind::ChannelPost {
            debug!(chat_id = %message.chat_id, "Skipping non-channel message");
            return IngestOutcome::Ignored;
        }

        let Some(body) = message.body() else {
            return IngestOutcome::Ignored;
        };

        let links = self.extractor.extract(body);
        let outcome = if links.is_empty() {
            debug!(chat_id = %message.chat_id, "No accepted links in message");
            IngestOutcome::NoMatch
        } else {
            let count = links.len();
            let queue_len = self.context.push_links(links);
            info!(
                chat_id = %message.chat_id,
                links = count,
                queue_len = queue_len,
                "Added links to the queue"
            );
            IngestOutcome::Queued { count, queue_len }
        };

        if self.config.acknowledge {
            self.acknowledge(message, &outcome).await;
        }
        outcome
    }

    /// Queue every accepted link in `text` without any chat reply
    pub fn ingest_text(&self, text: &str) -> Vec<Link> {
        let links = self.extractor.extract(text);
        if !links.is_empty() {
            let queue_len = self.context.push_links(links.clone());
            info!(links = links.len(), queue_len = queue_len, "Added links to the queue");
        }
        links
    }

    async fn acknowledge(&self, message: &InboundMessage, outcome: &IngestOutcome) {
        let reply = match outcome {
            IngestOutcome::Queued { count, .. } => format!("Queued {count} link(s)."),
            IngestOutcome::NoMatch => "No supported links found.".to_string(),
            IngestOutcome::Ignored => return,
        };

        if let Err(e) = self.sender.send(&message.chat_id, &reply).await {
            warn!(chat_id = %message.chat_id, error = %e, "Failed to acknowledge message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, IntervalMinutes};
    use crate::port::messenger::mocks::RecordingSender;

    fn listener(config: IngestionConfig) -> (Arc<RelayContext>, Arc<RecordingSender>, IngestionListener) {
        let context = RelayContext::shared(IntervalMinutes::default());
        let sender = Arc::new(RecordingSender::new());
        let listener = IngestionListener::new(
            Arc::clone(&context),
            LinkExtractor::default(),
            sender.clone(),
            config,
        );
        (context, sender, listener)
    }

    #[tokio::test]
    async fn test_queues_links_in_order() {
        let (context, sender, listener) = listener(IngestionConfig::default());
        let msg = InboundMessage::channel_post(
            -100_i64,
            "a https://terabox.com/1 b https://terabox.com/2",
        );

        let outcome = listener.on_message(&msg).await;

        assert_eq!(outcome, IngestOutcome::Queued { count: 2, queue_len: 2 });
        assert_eq!(
            context.queue().snapshot(),
            vec![Link::new("https://terabox.com/1"), Link::new("https://terabox.com/2")]
        );
        assert_eq!(context.stats().snapshot().enqueued_total, 2);
        // Acknowledgements are off by default
        assert_eq!(sender.attempts(), 0);
    }

    #[tokio::test]
    async fn test_caption_is_scanned() {
        let (context, _, listener) = listener(IngestionConfig::default());
        let msg = InboundMessage {
            chat_id: ChatId::from(-100_i64),
            kind: MessageKind::ChannelPost,
            text: None,
            caption: Some("photo https://teraboxapp.com/s/x".into()),
        };

        listener.on_message(&msg).await;
        assert_eq!(context.queue().len(), 1);
    }

    #[tokio::test]
    async fn test_no_body_is_ignored() {
        let (context, _, listener) = listener(IngestionConfig::default());
        let msg = InboundMessage {
            chat_id: ChatId::from(-100_i64),
            kind: MessageKind::ChannelPost,
            text: None,
            caption: None,
        };

        assert_eq!(listener.on_message(&msg).await, IngestOutcome::Ignored);
        assert!(context.queue().is_empty());
    }

    #[tokio::test]
    async fn test_group_messages_filtered_by_default() {
        let (context, _, listener) = listener(IngestionConfig::default());
        let msg = InboundMessage {
            chat_id: ChatId::from(42_i64),
            kind: MessageKind::Message,
            text: Some("https://terabox.com/abc".into()),
            caption: None,
        };

        assert_eq!(listener.on_message(&msg).await, IngestOutcome::Ignored);
        assert!(context.queue().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledgements() {
        let (_, sender, listener) = listener(IngestionConfig {
            acknowledge: true,
            channel_posts_only: false,
        });

        let hit = InboundMessage {
            chat_id: ChatId::from(7_i64),
            kind: MessageKind::Message,
            text: Some("https://terabox.com/abc".into()),
            caption: None,
        };
        let miss = InboundMessage {
            text: Some("nothing here".into()),
            ..hit.clone()
        };

        listener.on_message(&hit).await;
        listener.on_message(&miss).await;

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].destination, ChatId::from(7_i64));
        assert_eq!(sent[0].text, "Queued 1 link(s).");
        assert_eq!(sent[1].text, "No supported links found.");
    }

    #[tokio::test]
    async fn test_failed_ack_still_queues() {
        let context = RelayContext::shared(IntervalMinutes::default());
        let sender = Arc::new(RecordingSender::failing(1));
        let listener = IngestionListener::new(
            Arc::clone(&context),
            LinkExtractor::default(),
            sender,
            IngestionConfig {
                acknowledge: true,
                channel_posts_only: true,
            },
        );

        let outcome = listener
            .on_message(&InboundMessage::channel_post(-1_i64, "https://terabox.com/x"))
            .await;
        assert_eq!(outcome, IngestOutcome::Queued { count: 1, queue_len: 1 });
    }

    #[tokio::test]
    async fn test_concurrent_messages_all_land() {
        let (context, _, listener) = listener(IngestionConfig::default());
        let listener = Arc::new(listener);

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..50 {
            let listener = Arc::clone(&listener);
            tasks.spawn(async move {
                let msg = InboundMessage::channel_post(-1_i64, format!("https://terabox.com/{i}"));
                listener.on_message(&msg).await
            });
        }
        while let Some(res) = tasks.join_next().await {
            assert!(matches!(res.unwrap(), IngestOutcome::Queued { count: 1, .. }));
        }

        let mut links: Vec<String> = context
            .queue()
            .snapshot()
            .into_iter()
            .map(Link::into_inner)
            .collect();
        links.sort();
        links.dedup();
        assert_eq!(links.len(), 50);
    }

    #[test]
    fn test_ingest_text() {
        let (context, _, listener) = listener(IngestionConfig::default());
        let links = listener.ingest_text("https://terabox.com/a https://example.com/b");
        assert_eq!(links, vec![Link::new("https://terabox.com/a")]);
        assert_eq!(context.queue().len(), 1);

        assert!(listener.ingest_text("").is_empty());
        assert_eq!(context.queue().len(), 1);
    }
}
