use opentelemetry::{
    sdk::{trace::Tracer, Resource},
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::Config;

const HONEYCOMB_ENDPOINT: &str = "api.honeycomb.io:443";

/// Directives used when `LOG` is unset. Outside production the permission checks and request
/// traces are logged too.
const PRODUCTION_FILTER: &str = "info";
const DEVELOPMENT_FILTER: &str = "info,orgdesk_api=debug,orgdesk_auth=debug,tower_http=debug";

pub struct HoneycombConfig {
    pub team: String,
    pub dataset: String,
}

pub struct TracingConfig {
    pub service_name: String,
    pub environment: String,
    pub default_filter: &'static str,
    pub honeycomb: Option<HoneycombConfig>,
}

impl TracingConfig {
    pub fn from_config(config: &Config) -> Self {
        TracingConfig {
            service_name: "orgdesk".to_string(),
            environment: config.env.clone(),
            default_filter: if config.production() {
                PRODUCTION_FILTER
            } else {
                DEVELOPMENT_FILTER
            },
            honeycomb: config.honeycomb_team.clone().map(|team| HoneycombConfig {
                team,
                dataset: config.honeycomb_dataset.clone(),
            }),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env("LOG").unwrap_or_else(|_| EnvFilter::new(self.default_filter))
    }
}

/// Install the global subscriber: bunyan JSON lines on `console_sink`, plus span export to
/// Honeycomb when a team key is configured.
pub fn configure<W>(config: TracingConfig, console_sink: W) -> Result<(), anyhow::Error>
where
    W: for<'a> MakeWriter<'a> + 'static + Send + Sync,
{
    LogTracer::builder()
        .ignore_crate("rustls")
        .with_max_level(log::LevelFilter::Debug)
        .init()?;

    let tracer = config
        .honeycomb
        .as_ref()
        .map(|honeycomb| honeycomb_tracer(honeycomb, &config.environment))
        .transpose()?;
    let telemetry = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let subscriber = Registry::default()
        .with(config.env_filter())
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(config.service_name, console_sink))
        .with(ErrorLayer::default())
        .with(telemetry);

    set_global_default(subscriber)?;
    Ok(())
}

fn honeycomb_tracer(config: &HoneycombConfig, environment: &str) -> Result<Tracer, anyhow::Error> {
    let mut metadata = tonic::metadata::MetadataMap::new();
    metadata.insert("x-honeycomb-team", config.team.parse()?);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(HONEYCOMB_ENDPOINT)
        .with_metadata(metadata);

    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.dataset.clone()),
        KeyValue::new("deployment.environment", environment.to_string()),
    ]);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(opentelemetry::sdk::trace::config().with_resource(resource))
        .with_exporter(exporter)
        .install_batch(opentelemetry::runtime::TokioCurrentThread)?;
    Ok(tracer)
}

/// Flush spans still waiting in the exporter batch.
pub fn teardown() {
    opentelemetry::global::shutdown_tracer_provider();
}
