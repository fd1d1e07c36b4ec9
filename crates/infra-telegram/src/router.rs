// Update routing: commands go to the command handler, everything else to ingestion

use crate::types::Update;
use linkrelay_core::application::{
    BotCommand, IngestOutcome, IngestionListener, IntervalCommandHandler,
};
use linkrelay_core::domain::ChatId;
use linkrelay_core::port::MessageSender;
use std::sync::Arc;
use tracing::{debug, warn};

/// How an update was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Update carried no message
    Skipped,
    /// A known command was answered
    Command,
    /// Passed to the ingestion listener
    Ingested(IngestOutcome),
}

pub struct UpdateRouter {
    listener: Arc<IngestionListener>,
    commands: Arc<IntervalCommandHandler>,
    replies: Arc<dyn MessageSender>,
}

impl UpdateRouter {
    pub fn new(
        listener: Arc<IngestionListener>,
        commands: Arc<IntervalCommandHandler>,
        replies: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            listener,
            commands,
            replies,
        }
    }

    pub async fn route(&self, update: Update) -> RouteOutcome {
        let update_id = update.update_id;
        let Some(message) = update.into_inbound() else {
            debug!(update_id = update_id, "Update without message, skipping");
            return RouteOutcome::Skipped;
        };

        // Commands are only read from plain text, never from media captions
        let command = message.text.as_deref().and_then(BotCommand::parse);
        let reply = match command {
            Some(BotCommand::SetInterval(arg)) => Some(self.commands.handle(arg.as_deref())),
            Some(BotCommand::Status) => Some(self.commands.status_reply()),
            Some(BotCommand::Unknown(_)) | None => None,
        };

        match reply {
            Some(text) => {
                self.reply(&message.chat_id, &text).await;
                RouteOutcome::Command
            }
            None => RouteOutcome::Ingested(self.listener.on_message(&message).await),
        }
    }

    async fn reply(&self, chat_id: &ChatId, text: &str) {
        if let Err(e) = self.replies.send(chat_id, text).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to send command reply");
        }
    }
}
