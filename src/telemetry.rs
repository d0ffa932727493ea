use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize tracing with JSON output for structured logging. RUST_LOG
/// overrides the configured level.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(filter)
        .init();

    tracing::info!("telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related backend requests.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common workflow attributes.
pub fn create_workflow_span(
    operation: &str,
    report_id: Option<u64>,
    finding_id: Option<u64>,
) -> tracing::Span {
    tracing::info_span!(
        "finding_workflow",
        operation = operation,
        report.id = report_id,
        finding.id = finding_id,
    )
}
