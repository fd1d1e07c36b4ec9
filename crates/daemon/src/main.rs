//! Link Relay - Main Entry Point
//! Collects links posted to a chat and relays them one at a time on a timer.

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// Import workspace crates
use linkrelay_api_rpc::RpcServer;
use linkrelay_core::application::{
    shutdown_channel, Dispatcher, IngestionListener, IntervalCommandHandler, RelayContext,
};
use linkrelay_core::port::{MessageSender, SystemTimeProvider, TokioTimer};
use linkrelay_infra_telegram::{TelegramClient, UpdatePoller, UpdateRouter, UpdateSource};
use settings::Settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (+ OpenTelemetry when enabled)
    let telemetry_guard = telemetry::init()?;

    info!("Link Relay v{} starting...", VERSION);
    if telemetry_guard.otel_enabled() {
        info!("OpenTelemetry export enabled");
    }

    // 2. Load configuration (missing token/destination is fatal)
    let settings = Settings::load().context("Configuration error")?;
    info!(
        destination = %settings.relay.destination_chat_id,
        interval_minutes = settings.relay.interval_minutes,
        hosts = ?settings.relay.accepted_hosts,
        "Configuration loaded"
    );

    // 3. Chat platform client, verified before anything starts
    let client = Arc::new(
        TelegramClient::new(&settings.telegram_config())
            .context("Failed to create Telegram client")?,
    );
    match client.get_me().await {
        Ok(me) => info!(bot_id = me.id, username = ?me.username, "Bot identity verified"),
        Err(e) if e.is_unauthorized() => {
            return Err(anyhow::Error::new(e).context("Bot token rejected by the Bot API"));
        }
        // Network trouble at boot is not fatal; the poller keeps retrying
        Err(e) => warn!(error = %e, "Could not verify bot identity, continuing"),
    }

    // 4. Setup dependencies (DI wiring)
    let context = RelayContext::shared(settings.initial_interval()?);
    let sender: Arc<dyn MessageSender> = client.clone();
    let source: Arc<dyn UpdateSource> = client.clone();

    let listener = Arc::new(IngestionListener::new(
        Arc::clone(&context),
        settings.extractor(),
        Arc::clone(&sender),
        settings.ingestion_config(),
    ));
    let commands = Arc::new(IntervalCommandHandler::new(Arc::clone(&context)));
    let router = Arc::new(UpdateRouter::new(
        Arc::clone(&listener),
        Arc::clone(&commands),
        Arc::clone(&sender),
    ));
    let dispatcher = Dispatcher::new(
        Arc::clone(&context),
        Arc::clone(&sender),
        Arc::new(TokioTimer),
        Arc::new(SystemTimeProvider),
        settings.dispatcher_config(),
    );
    let poller = UpdatePoller::new(source, router);

    // 5. Start JSON-RPC server (health + admin)
    info!("Starting JSON-RPC server...");
    let rpc_server = RpcServer::new(
        settings.rpc_config(),
        Arc::clone(&context),
        listener,
        commands,
    );
    let (rpc_addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Start dispatcher and update poller
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let dispatcher_shutdown = shutdown_tx.token();
    let dispatcher_task = tokio::spawn(async move { dispatcher.run(dispatcher_shutdown).await });
    let poller_task = tokio::spawn(async move { poller.run(shutdown_rx).await });

    info!(rpc_addr = %rpc_addr, "✅ System ready. Waiting for links...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;

    for (name, task) in [("dispatcher", dispatcher_task), ("poller", poller_task)] {
        match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(task = name, error = %e, "Task panicked"),
            Err(_) => warn!(task = name, "Task did not stop in time"),
        }
    }

    info!(pending = context.queue().len(), "Shutdown complete.");

    Ok(())
}
