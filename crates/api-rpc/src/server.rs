//! JSON-RPC Server
//!
//! Admin methods over JSON-RPC 2.0 (HTTP POST), plus `GET /` and
//! `GET /health` proxied onto `health.v1` for plain HTTP liveness probes.

use crate::handler::RpcHandler;
use crate::types::{EnqueueRequest, PendingRequest, SetIntervalRequest, StatsRequest};
use jsonrpsee::server::middleware::http::ProxyGetRequestLayer;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use linkrelay_core::application::{IngestionListener, IntervalCommandHandler, RelayContext};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "0.0.0.0";
const DEFAULT_RPC_PORT: u16 = 8080;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        context: Arc<RelayContext>,
        listener: Arc<IngestionListener>,
        commands: Arc<IntervalCommandHandler>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(context, listener, commands)),
        }
    }

    /// Build the method table
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_method("health.v1", move |_, _, _| handler.health())
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("relay.stats.v1", move |params, _, _| {
                let req: StatsRequest = params.parse().unwrap_or_default();
                handler.stats(req)
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("relay.set_interval.v1", move |params, _, _| {
                let req: SetIntervalRequest = params.parse()?;
                handler.set_interval(req)
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("relay.enqueue.v1", move |params, _, _| {
                let req: EnqueueRequest = params.parse()?;
                handler.enqueue(req)
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method("relay.pending.v1", move |params, _, _| {
                let req: PendingRequest = params.parse().unwrap_or_default();
                handler.pending(req)
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Bind and start serving. Returns the bound address (useful with port 0).
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let http_middleware = tower::ServiceBuilder::new()
            .layer(ProxyGetRequestLayer::new("/", "health.v1").map_err(|e| e.to_string())?)
            .layer(ProxyGetRequestLayer::new("/health", "health.v1").map_err(|e| e.to_string())?);

        let server = Server::builder()
            .set_http_middleware(http_middleware)
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;
        let module = self.module()?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        Ok((local_addr, server.start(module)))
    }
}
