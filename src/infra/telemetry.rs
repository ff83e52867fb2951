use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the export pipeline emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "markprint_export_sessions_opened_total",
            Unit::Count,
            "Total number of browser sessions launched for exports."
        );
        describe_counter!(
            "markprint_export_sessions_released_total",
            Unit::Count,
            "Total number of browser sessions torn down."
        );
        describe_gauge!(
            "markprint_export_sessions_active",
            Unit::Count,
            "Browser sessions currently open."
        );
        describe_counter!(
            "markprint_export_failures_total",
            Unit::Count,
            "Total number of failed exports, labelled by pipeline stage."
        );
        describe_histogram!(
            "markprint_export_duration_ms",
            Unit::Milliseconds,
            "End-to-end export latency in milliseconds, labelled by format."
        );
    });
}
