//! Chat commands
//!
//! - `/set_interval <minutes>`: replace the dispatch interval
//! - `/status`: report pending links and the current interval

use crate::application::context::RelayContext;
use crate::domain::{DomainError, IntervalMinutes};
use std::sync::Arc;
use tracing::{info, warn};

/// A recognised bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    SetInterval(Option<String>),
    Status,
    Unknown(String),
}

impl BotCommand {
    /// Parse a message body that starts with `/`.
    ///
    /// Returns `None` for anything that is not a command. The `@botname`
    /// suffix Telegram appends in groups is stripped.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
        let arg = parts.next().map(str::to_string);

        Some(match name.as_str() {
            "set_interval" => BotCommand::SetInterval(arg),
            "status" => BotCommand::Status,
            _ => BotCommand::Unknown(name),
        })
    }
}

/// Validates and applies interval changes
pub struct IntervalCommandHandler {
    context: Arc<RelayContext>,
}

impl IntervalCommandHandler {
    pub fn new(context: Arc<RelayContext>) -> Self {
        Self { context }
    }

    /// Parse `arg` and swap it into the interval store.
    ///
    /// On error the store is left untouched.
    pub fn set_interval(&self, arg: Option<&str>) -> Result<IntervalMinutes, DomainError> {
        let next = IntervalMinutes::parse(arg).inspect_err(|e| {
            warn!(argument = ?arg, error = %e, "Rejected interval change");
        })?;

        let prev = self.context.interval().replace(next);
        info!(
            previous_minutes = prev.get(),
            interval_minutes = next.get(),
            "Sending interval updated"
        );
        Ok(next)
    }

    /// Same as [`set_interval`](Self::set_interval), rendered as a chat reply
    pub fn handle(&self, arg: Option<&str>) -> String {
        match self.set_interval(arg) {
            Ok(minutes) => format!("Sending interval updated to {minutes} minutes."),
            Err(e) => e.user_message(),
        }
    }

    pub fn status_reply(&self) -> String {
        format!(
            "{} link(s) pending. Sending one every {} minutes.",
            self.context.queue().len(),
            self.context.interval().current()
        )
    }
}
