use std::time::Duration;

use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{self, Protocol, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::util::env::{Env, LogFormat};

pub type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

const DEFAULT_FILTER: &str = "higher_lower_server=debug,tower_http=debug,axum=debug,sqlx=info,info";

#[derive(Debug, Clone)]
struct Providers {
    logger: SdkLoggerProvider,
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
}

/// Owns the subscriber setup and, when a collector is configured, the OTLP providers that must be
/// flushed on exit.
#[derive(Debug, Clone)]
pub struct Telemetry {
    tracer_name: String,
    log_format: LogFormat,
    providers: Option<Providers>,
}

impl Telemetry {
    pub fn new(env: &Env) -> Result<Telemetry> {
        let collector_url = env
            .otel_exporter_otlp_endpoint
            .as_deref()
            .filter(|url| !url.is_empty());

        let providers = match collector_url {
            Some(collector_url) => {
                let base_resource =
                    base_attrs(env.api_service_name.clone(), env!("CARGO_PKG_VERSION"));

                Some(Providers {
                    logger: build_logger_provider(collector_url, base_resource.clone())?,
                    tracer: build_tracer_provider(collector_url, base_resource.clone())?,
                    meter: build_meter_provider(collector_url, base_resource)?,
                })
            }
            None => None,
        };

        Ok(Self {
            tracer_name: env.api_tracer_name.clone(),
            log_format: env.log_format,
            providers,
        })
    }

    pub fn register(self) -> Self {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let (trace_layer, log_layer, meter_layer) = match &self.providers {
            Some(providers) => {
                global::set_tracer_provider(providers.tracer.clone());
                let tracer = global::tracer(self.tracer_name.clone());

                (
                    Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                    Some(OpenTelemetryTracingBridge::new(&providers.logger)),
                    Some(tracing_opentelemetry::MetricsLayer::new(
                        providers.meter.clone(),
                    )),
                )
            }
            None => (None, None, None),
        };

        let (pretty_layer, json_layer) = match self.log_format {
            LogFormat::Pretty => (
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_line_number(true),
                ),
                None,
            ),
            LogFormat::Json => (
                None,
                Some(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_line_number(true),
                ),
            ),
        };

        tracing_subscriber::registry()
            .with(trace_layer)
            .with(log_layer)
            .with(meter_layer)
            .with(filter)
            .with(pretty_layer)
            .with(json_layer)
            .init();

        self
    }

    pub fn shutdown(self) {
        let Some(providers) = self.providers else {
            return;
        };

        if let Err(e) = providers.meter.shutdown() {
            eprintln!("error during metering shutdown: {e:?}");
        }

        if let Err(e) = providers.logger.shutdown() {
            eprintln!("error during logging shutdown: {e:?}");
        }

        if let Err(e) = providers.tracer.shutdown() {
            eprintln!("error during tracing shutdown: {e:?}");
        }
    }
}

fn build_logger_provider(collector_url: &str, base_resource: Resource) -> Result<SdkLoggerProvider> {
    let exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(Endpoint::Logs.to_url(collector_url))
        .with_timeout(Duration::from_secs(5))
        .build()?;

    Ok(SdkLoggerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_tracer_provider(collector_url: &str, base_resource: Resource) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(Endpoint::Traces.to_url(collector_url))
        .with_timeout(Duration::from_secs(5))
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn build_meter_provider(collector_url: &str, base_resource: Resource) -> Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_protocol(Protocol::Grpc)
        .with_endpoint(Endpoint::Metrics.to_url(collector_url))
        .with_timeout(Duration::from_secs(5))
        .build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(base_resource)
        .build())
}

fn base_attrs(name: String, version: &'static str) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", name),
            KeyValue::new("service.version", version),
        ])
        .build()
}

enum Endpoint {
    Logs,
    Traces,
    Metrics,
}

impl Endpoint {
    fn to_url(&self, collector_endpoint: &str) -> String {
        let location = match self {
            Endpoint::Logs => "/v1/logs",
            Endpoint::Traces => "/v1/traces",
            Endpoint::Metrics => "/v1/metrics",
        };

        format!("{}{location}", collector_endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            Endpoint::Traces.to_url("http://collector:4317/"),
            "http://collector:4317/v1/traces"
        );
        assert_eq!(
            Endpoint::Logs.to_url("http://collector:4317"),
            "http://collector:4317/v1/logs"
        );
    }

    #[test]
    fn test_no_collector_means_no_providers() {
        let env: Env = crate::util::env::from_iter(vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/game".to_string()),
            ("OTEL_EXPORTER_OTLP_ENDPOINT".to_string(), String::new()),
        ])
        .unwrap();

        let telemetry = Telemetry::new(&env).unwrap();
        assert!(telemetry.providers.is_none());
        assert_eq!(telemetry.tracer_name, crate::constants::TRACER_NAME);
    }
}
