// Application Layer - Use Cases and Relay Logic

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod ingest;
pub mod shutdown;
pub mod stats;

// Re-exports
pub use command::{BotCommand, IntervalCommandHandler};
pub use context::RelayContext;
pub use dispatcher::{CycleOutcome, Dispatcher, DispatcherConfig};
pub use ingest::{IngestOutcome, IngestionConfig, IngestionListener};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use stats::{DispatcherState, RelayStats, StatsSnapshot};
