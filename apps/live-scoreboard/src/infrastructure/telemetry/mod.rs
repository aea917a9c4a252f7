//! Tracing setup for the scoreboard process.
//!
//! Log lines go to stdout through an `EnvFilter`-gated fmt layer. Spans are
//! also exported over OTLP/gRPC unless `OTEL_ENABLED=false`.
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_LOG` | added on top of [`DEFAULT_DIRECTIVES`] |
//! | `OTEL_ENABLED` | `true` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` |
//! | `OTEL_SERVICE_NAME` | `live-scoreboard` |
//!
//! ```ignore
//! let _telemetry = live_scoreboard::infrastructure::telemetry::init()?;
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

const DEFAULT_SERVICE_NAME: &str = "live-scoreboard";

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Directives always added to the `RUST_LOG` filter.
pub const DEFAULT_DIRECTIVES: &[&str] = &[
    "live_scoreboard=info",
    "tower_http=info",
    "h2=warn",
    "hyper=warn",
];

/// Flushes and stops span export when dropped. Hold it for the process
/// lifetime.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    #[must_use]
    pub const fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("span exporter shutdown failed: {e}");
        }
    }
}

/// Span export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Export spans over OTLP.
    pub enabled: bool,
    /// Collector endpoint.
    pub otlp_endpoint: String,
    /// `service.name` resource attribute.
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Export stays on unless `OTEL_ENABLED` is `false`, `0` or `off`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let enabled = lookup("OTEL_ENABLED").is_none_or(|v| {
            !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off")
        });

        Self {
            enabled,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or(defaults.otlp_endpoint),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

/// Why tracing could not be installed.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Bad filter directive.
    #[error("invalid filter directive: {0}")]
    Directive(#[from] ParseError),

    /// OTLP exporter construction failed.
    #[error("failed to create OTLP exporter: {0}")]
    Exporter(#[from] ExporterBuildError),

    /// Another global subscriber won.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Install tracing using [`TelemetryConfig::from_env`].
///
/// # Errors
///
/// See [`init_with_config`].
pub fn init() -> Result<TelemetryGuard, TelemetryError> {
    init_with_config(TelemetryConfig::from_env())
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on a bad `RUST_LOG` directive, an exporter that cannot be built, or
/// when a subscriber is already installed.
pub fn init_with_config(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = env_filter()?;
    let provider = if config.enabled {
        Some(tracer_provider(&config)?)
    } else {
        None
    };
    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(config.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(otel_layer)
        .try_init()?;

    Ok(TelemetryGuard {
        tracer_provider: provider,
    })
}

fn tracer_provider(config: &TelemetryConfig) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(config.service_name.clone())
                .build(),
        )
        .build())
}

fn env_filter() -> Result<EnvFilter, ParseError> {
    DEFAULT_DIRECTIVES
        .iter()
        .try_fold(EnvFilter::from_default_env(), |filter, directive| {
            Ok(filter.add_directive(directive.parse::<Directive>()?))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(TelemetryConfig::from_lookup(lookup(&[])), TelemetryConfig::default());
    }

    #[test_case("false", false)]
    #[test_case("FALSE", false)]
    #[test_case("0", false)]
    #[test_case("off", false)]
    #[test_case("true", true)]
    #[test_case("yes", true)]
    fn otel_enabled_flag(value: &str, expected: bool) {
        let config = TelemetryConfig::from_lookup(lookup(&[("OTEL_ENABLED", value)]));
        assert_eq!(config.enabled, expected);
    }

    #[test]
    fn endpoint_and_service_name_override() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
            ("OTEL_SERVICE_NAME", "scoreboard-staging"),
        ]));

        assert_eq!(config.otlp_endpoint, "http://collector:4317");
        assert_eq!(config.service_name, "scoreboard-staging");
    }

    #[test]
    fn built_in_directives_parse() {
        assert!(env_filter().is_ok());
    }
}
