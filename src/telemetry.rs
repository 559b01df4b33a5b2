//! Tracing subscriber setup
//!
//! Logs go to stdout as text or JSON. When `OTEL_EXPORTER_OTLP_ENDPOINT` is
//! set, spans are also exported over OTLP/gRPC and W3C trace context is
//! accepted from incoming webhook calls.

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogFormat;
use crate::error::{Error, Result};

const SERVICE_NAME: &str = "ssm-param-injector";
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Install the global subscriber. Verbosity is `info` unless `RUST_LOG` says
/// otherwise.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let tracer = match std::env::var(OTLP_ENDPOINT_ENV) {
        Ok(endpoint) => Some(init_otlp_tracer(&endpoint)?),
        Err(_) => None,
    };
    let otel_enabled = tracer.is_some();

    let registry = tracing_subscriber::registry().with(env_filter);
    let initialized = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true))
            .with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
            .try_init(),
    };
    initialized.map_err(|e| Error::ConfigError(format!("Failed to install subscriber: {e}")))?;

    if otel_enabled {
        info!("OpenTelemetry tracing initialized");
    } else {
        info!("OpenTelemetry tracing disabled ({OTLP_ENDPOINT_ENV} not set)");
    }
    Ok(())
}

fn init_otlp_tracer(endpoint: &str) -> Result<sdktrace::Tracer> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::config()
                .with_resource(Resource::new(vec![KeyValue::new("service.name", SERVICE_NAME)])),
        )
        .install_batch(runtime::Tokio)
        .map_err(|e| Error::ConfigError(format!("Failed to initialize OTLP exporter: {e}")))
}

/// Flush buffered spans. Safe to call when OpenTelemetry was never enabled.
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}
