//! Logging and optional OpenTelemetry export
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `linkrelay=info` for every relay crate)
//! - `LINKRELAY_LOG_FORMAT`: `json` for production, anything else for pretty output
//! - `LINKRELAY_LOG_DIR`: also write a daily rolling file into this directory
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: linkrelay)
//!
//! ```text
//! LINKRELAY_LOG_FORMAT=json \
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
//!     ./linkrelay
//! ```

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "linkrelay=info,linkrelay_core=info,linkrelay_infra_telegram=info,linkrelay_api_rpc=info,hyper=warn,reqwest=warn";
const LOG_FILE_PREFIX: &str = "linkrelay";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background log writer and exporter alive until dropped
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
    otel: bool,
}

impl TelemetryGuard {
    pub fn otel_enabled(&self) -> bool {
        self.otel
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if self.otel {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Install the global subscriber
pub fn init() -> Result<TelemetryGuard> {
    let json = std::env::var("LINKRELAY_LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if json {
        // Production: JSON structured logging
        layers.push(fmt::layer().json().boxed());
    } else {
        // Development: Pretty formatting with colors
        layers.push(fmt::layer().pretty().boxed());
    }

    let mut file_guard = None;
    if let Ok(dir) = std::env::var("LINKRELAY_LOG_DIR") {
        let dir = shellexpand::tilde(&dir).into_owned();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {dir}"))?;

        let appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(&dir)
            .context("Failed to create rolling file appender")?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);

        let layer = if json {
            fmt::layer().json().with_writer(writer).boxed()
        } else {
            fmt::layer().with_ansi(false).with_writer(writer).boxed()
        };
        layers.push(layer);
    }

    let otel_layer = otel_layer()?;
    let otel = otel_layer.is_some();
    layers.extend(otel_layer);

    tracing_subscriber::registry()
        .with(layers.with_filter(env_filter))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() && !otel {
        tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
        tracing::warn!("Rebuild with: cargo build --features telemetry");
    }

    Ok(TelemetryGuard {
        _file: file_guard,
        otel,
    })
}

#[cfg(not(feature = "telemetry"))]
fn otel_layer() -> Result<Option<BoxedLayer>> {
    Ok(None)
}

#[cfg(feature = "telemetry")]
fn otel_layer() -> Result<Option<BoxedLayer>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use opentelemetry_sdk::Resource;

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "linkrelay".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .context("Failed to build OTLP exporter")?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();
    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Some(
        tracing_opentelemetry::layer().with_tracer(tracer).boxed(),
    ))
}
