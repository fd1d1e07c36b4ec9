//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    EnqueueRequest, EnqueueResponse, PendingRequest, PendingResponse, SetIntervalRequest,
    SetIntervalResponse, StatsRequest, StatsResponse, HEALTH_TEXT,
};
use jsonrpsee::types::ErrorObjectOwned;
use linkrelay_core::application::{IngestionListener, IntervalCommandHandler, RelayContext};
use linkrelay_core::domain::Link;
use linkrelay_core::error::AppError;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    context: Arc<RelayContext>,
    listener: Arc<IngestionListener>,
    commands: Arc<IntervalCommandHandler>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        context: Arc<RelayContext>,
        listener: Arc<IngestionListener>,
        commands: Arc<IntervalCommandHandler>,
    ) -> Self {
        Self {
            context,
            listener,
            commands,
            start_time: std::time::Instant::now(),
        }
    }

    /// health.v1
    pub fn health(&self) -> String {
        HEALTH_TEXT.to_string()
    }

    /// relay.stats.v1
    pub fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        let snapshot = self.context.stats().snapshot();
        Ok(StatsResponse {
            queue_length: self.context.queue().len(),
            interval_minutes: self.context.interval().current().get(),
            dispatcher_state: snapshot.dispatcher_state,
            enqueued_total: snapshot.enqueued_total,
            sent_total: snapshot.sent_total,
            failed_total: snapshot.failed_total,
            empty_cycles: snapshot.empty_cycles,
            busy_cycles: snapshot.busy_cycles,
            last_sent_at: snapshot.last_sent_at,
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }

    /// relay.set_interval.v1
    pub fn set_interval(
        &self,
        params: SetIntervalRequest,
    ) -> Result<SetIntervalResponse, ErrorObjectOwned> {
        let arg = params.interval.as_argument();
        let minutes = self
            .commands
            .set_interval(Some(&arg))
            .map_err(|e| to_rpc_error(AppError::Domain(e)))?;

        Ok(SetIntervalResponse {
            interval_minutes: minutes.get(),
            message: format!("Sending interval updated to {minutes} minutes."),
        })
    }

    /// relay.enqueue.v1
    pub fn enqueue(&self, params: EnqueueRequest) -> Result<EnqueueResponse, ErrorObjectOwned> {
        if params.text.trim().is_empty() {
            return Err(to_rpc_error(AppError::Validation(
                "text must not be empty".to_string(),
            )));
        }

        let links = self.listener.ingest_text(&params.text);
        info!(links = links.len(), "Manual enqueue via RPC");

        Ok(EnqueueResponse {
            links: links.into_iter().map(Link::into_inner).collect(),
            queue_length: self.context.queue().len(),
        })
    }

    /// relay.pending.v1
    pub fn pending(&self, params: PendingRequest) -> Result<PendingResponse, ErrorObjectOwned> {
        let snapshot = self.context.queue().snapshot();
        let total = snapshot.len();
        let limit = params.limit.unwrap_or(total);

        Ok(PendingResponse {
            links: snapshot
                .into_iter()
                .take(limit)
                .map(Link::into_inner)
                .collect(),
            total,
        })
    }
}
