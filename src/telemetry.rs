use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging on stderr.
///
/// Stdout belongs to the operator dialogue, so every layer writes to stderr.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_telemetry(settings: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("site-verifier telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the records of one run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Root span for one verification workflow run
pub fn create_workflow_span(correlation_id: &str) -> tracing::Span {
    tracing::info_span!("site_verification", correlation.id = correlation_id)
}
