//! Logging and OpenTelemetry pipeline for the `zerobot` binary.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set the OTLP HTTP exporter is activated. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `ZEROBOT_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber, with an OTLP span exporter when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// Hold the returned guard for the lifetime of the process; dropping it
/// flushes pending spans.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let use_json = std::env::var("ZEROBOT_LOG_FORMAT").as_deref() == Ok("json");

    let provider = build_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("zerobot")));

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);
    if use_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracerProviderGuard(provider)
}

/// Shuts the OTel [`SdkTracerProvider`] down on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[zerobot] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[zerobot] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Tracing is installed before the Tokio runtime exists, so the
            // exporter must not spawn tasks.
            .with_simple_exporter(exporter)
            .build(),
    )
}
