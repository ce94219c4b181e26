//! # Logging and telemetry
//!
//! Every attempt is reported as a `tracing` event and printed to stderr as a
//! single line by `tracing_subscriber::fmt`. Verbosity follows `RUST_LOG`
//! (default `info`).
//!
//! On top of that, attempts can be exported through OpenTelemetry.
//!
//! ## Feature matrix
//!
//! - `traces`: Exports one `attempt` span per call.
//! - `metrics`: Exports attempt counters and a latency histogram.
//! - `honeycomb`: Enables the Honeycomb OTLP exporter.
//! - `stdout`: Enables the stdout OTLP exporter.
//!
//! ## Feature constraints
//!
//! - Exporters require using at least one of: `traces` or `metrics`.
//! - Both `honeycomb` and `stdout` exporters can be enabled at the same time.
//!
//! ## Example usage
//!
//! ```bash
//! cargo run --features traces,metrics,stdout -- --max-attempts 3
//! ```

// Disallow using `honeycomb` without `traces` or `metrics`
#[cfg(all(
    feature = "honeycomb",
    not(any(feature = "traces", feature = "metrics"))
))]
compile_error!(
    "The 'honeycomb' feature requires at least one of 'traces' or 'metrics' to be enabled."
);

// Disallow using `stdout` without `traces` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "traces", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'traces' or 'metrics' to be enabled."
);

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Honeycomb-specific imports
#[cfg(all(feature = "honeycomb", any(feature = "metrics", feature = "traces")))]
use opentelemetry_otlp::{Compression, Protocol, WithExportConfig, WithTonicConfig};
#[cfg(all(feature = "honeycomb", feature = "metrics"))]
use opentelemetry_sdk::metrics::Temporality;
#[cfg(feature = "honeycomb")]
use tonic::metadata::MetadataMap;
#[cfg(all(feature = "honeycomb", any(feature = "metrics", feature = "traces")))]
use tonic::transport::ClientTlsConfig;

// Metrics-specific imports
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "traces"))]
use opentelemetry_semantic_conventions as semvcns;

// Tracing-specific imports
#[cfg(feature = "traces")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "traces")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "traces")]
use opentelemetry_sdk::trace as sdktrace;

const SERVICE_NAME: &str = "greeter-client";

pub struct TelemetryProviders {
    #[cfg(feature = "traces")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes pending spans and metrics and shuts the exporters down.
    ///
    /// Only reached by bounded runs; an unbounded loop is cut by process
    /// termination.
    pub fn shutdown(self) {
        #[cfg(feature = "traces")]
        {
            if let Err(err) = self.tracer_provider.force_flush() {
                eprintln!("Error flushing traces: {:#?}", err);
            }
            if let Err(err) = self.tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer: {:#?}", err);
            }
        }

        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {:#?}", err);
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {:#?}", err);
            }
        }
    }
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "traces")]
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    #[cfg(feature = "traces")]
    let tracer_provider = init_tracer()?;

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics()?;

    #[cfg(any(feature = "metrics", feature = "traces"))]
    let scope = InstrumentationScope::builder(SERVICE_NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // One line per event on stderr. This is unrelated to the
    // `opentelemetry_stdout` exporter.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .compact(),
        );

    #[cfg(feature = "traces")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.init();

    Ok(TelemetryProviders {
        #[cfg(feature = "traces")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(feature = "honeycomb")]
struct HoneycombExport {
    metadata: MetadataMap,
    endpoint: String,
    compression: Compression,
}

#[cfg(feature = "honeycomb")]
fn honeycomb_export() -> anyhow::Result<HoneycombExport> {
    use anyhow::Context;
    use std::str::FromStr;

    let mut metadata = MetadataMap::new();
    let api_key = std::env::var("HONEYCOMB_API_KEY").context("missing `HONEYCOMB_API_KEY`")?;
    let dataset = std::env::var("HONEYCOMB_DATASET").context("missing `HONEYCOMB_DATASET`")?;
    metadata.insert(
        "x-honeycomb-team",
        api_key.parse().context("invalid API key")?,
    );
    metadata.insert(
        "x-honeycomb-dataset",
        dataset.parse().context("invalid dataset")?,
    );

    let endpoint = std::env::var("HONEYCOMB_ENDPOINT").context("missing `HONEYCOMB_ENDPOINT`")?;
    let raw = std::env::var("HONEYCOMB_COMPRESSION")
        .context("missing `HONEYCOMB_COMPRESSION`")?
        .to_ascii_lowercase();
    let compression = Compression::from_str(&raw)?;

    Ok(HoneycombExport {
        metadata,
        endpoint,
        compression,
    })
}

#[cfg(any(feature = "metrics", feature = "traces"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> anyhow::Result<sdkmetrics::SdkMeterProvider> {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    #[cfg(feature = "honeycomb")]
    let builder = {
        use anyhow::Context;

        let export = honeycomb_export()?;
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_tls_config(ClientTlsConfig::new().with_native_roots())
            .with_metadata(export.metadata)
            .with_timeout(std::time::Duration::from_secs(10))
            .with_compression(export.compression)
            .with_endpoint(export.endpoint)
            .with_protocol(Protocol::Grpc)
            .with_temporality(Temporality::Delta)
            .build()
            .context("failed to build metrics exporter")?;

        builder.with_periodic_exporter(exporter)
    };

    Ok(builder.build())
}

#[cfg(feature = "traces")]
fn init_tracer() -> anyhow::Result<sdktrace::SdkTracerProvider> {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let exporter = SpanExporter::default();
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();
        builder.with_span_processor(batch)
    };

    #[cfg(feature = "honeycomb")]
    let builder = {
        use anyhow::Context;

        let export = honeycomb_export()?;
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_tls_config(ClientTlsConfig::new().with_native_roots())
            .with_metadata(export.metadata)
            .with_timeout(std::time::Duration::from_secs(10))
            .with_compression(export.compression)
            .with_endpoint(export.endpoint)
            .with_protocol(Protocol::Grpc)
            .build()
            .context("failed to build tracer exporter")?;

        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();

        builder.with_span_processor(batch)
    };

    Ok(builder.build())
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static ATTEMPTS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static ATTEMPT_FAILURES: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static ATTEMPT_LATENCY_MS: OnceLock<Histogram<f64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = ATTEMPTS.set(
        meter
            .u64_counter("attempts")
            .with_description("Total SayHello attempts")
            .build(),
    );

    let _ = ATTEMPT_FAILURES.set(
        meter
            .u64_counter("attempt_failures")
            .with_description("SayHello attempts that failed or timed out")
            .build(),
    );

    let _ = ATTEMPT_LATENCY_MS.set(
        meter
            .f64_histogram("attempt_latency")
            .with_unit("ms")
            .with_description("Time from sending SayHello to its outcome")
            .build(),
    );
}

// Convenience functions that compile to no-ops when metrics are disabled
#[cfg(feature = "metrics")]
pub fn increment_attempts() {
    if let Some(counter) = ATTEMPTS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_attempts() {}

#[cfg(feature = "metrics")]
pub fn increment_attempt_failures() {
    if let Some(counter) = ATTEMPT_FAILURES.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_attempt_failures() {}

#[cfg(feature = "metrics")]
pub fn record_attempt_latency(latency_ms: f64) {
    if let Some(histogram) = ATTEMPT_LATENCY_MS.get() {
        histogram.record(latency_ms, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_attempt_latency(_latency_ms: f64) {}
