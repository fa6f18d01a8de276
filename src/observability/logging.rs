//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! `RUST_LOG` takes precedence over the configured log level. In JSON mode
//! each line carries the current span, so every log line of a reconciliation
//! includes the request's namespace and name.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Result, SyncError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Create the span wrapping one reconciliation of a request object.
///
/// ```rust,ignore
/// let span = sync_span!("team-a", "db-credentials");
/// let span = sync_span!("team-a", "db-credentials", secret_type = "Opaque");
/// ```
#[macro_export]
macro_rules! sync_span {
    ($namespace:expr, $name:expr) => {
        tracing::info_span!(
            "sync",
            namespace = %$namespace,
            name = %$name,
            client_id = tracing::field::Empty
        )
    };
    ($namespace:expr, $name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "sync",
            namespace = %$namespace,
            name = %$name,
            client_id = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a debug span for one vault API call
#[macro_export]
macro_rules! vault_span {
    ($resource:expr, $verb:expr) => {
        tracing::debug_span!("vault_request", resource = %$resource, verb = %$verb)
    };
    ($resource:expr, $verb:expr, $($field:tt)*) => {
        tracing::debug_span!("vault_request", resource = %$resource, verb = %$verb, $($field)*)
    };
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            SyncError::config_with_source(
                format!("Invalid log level '{}'", config.log_level),
                Box::new(e),
            )
        })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_logging {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(false),
            )
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| SyncError::config_with_source("Failed to install logging", Box::new(e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        vault_uri = %config.vault.uri,
        client_id = %config.vault.client_id,
        policy_ttl_secs = config.cache.policy_ttl_seconds,
        client_ttl_secs = config.cache.client_ttl_seconds,
        index_ttl_secs = config.cache.index_ttl_seconds,
        metrics_enabled = %config.observability.enable_metrics,
        "vaultsync configuration"
    );
}
