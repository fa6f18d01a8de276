//! # Configuration Settings
//!
//! Defines the configuration structure for the synchronization core.

use crate::domain::SecretString;
use crate::errors::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

/// Data key holding the vault base URI in the operator settings secret
pub const SETTINGS_URI_KEY: &str = "uri";
/// Data key holding the operator client id
pub const SETTINGS_CLIENT_ID_KEY: &str = "clientId";
/// Data key holding the operator client secret
pub const SETTINGS_CLIENT_SECRET_KEY: &str = "clientSecret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Vault connection settings
    #[validate(nested)]
    pub vault: ConnectionSettings,

    /// Cache lifetimes
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(SyncError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        let uri = url::Url::parse(&self.vault.uri).map_err(|e| {
            let message = format!("Invalid vault URI '{}'", self.vault.uri);
            SyncError::config_with_source(message, Box::new(e))
        })?;
        if uri.scheme() != "https" && uri.scheme() != "http" {
            return Err(SyncError::config("Vault URI must start with 'https://' or 'http://'"));
        }

        if self.vault.client_secret.is_empty() {
            return Err(SyncError::config("Vault client secret cannot be empty"));
        }

        Ok(())
    }

    /// Create AppConfig from `VAULTSYNC_*` environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            vault: ConnectionSettings::from_env()?,
            cache: CacheConfig::from_env(),
            observability: ObservabilityConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Operator-wide vault connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    /// Vault base URI
    #[validate(length(min = 1, message = "Vault URI cannot be empty"))]
    pub uri: String,

    /// Operator client id, used for policy discovery
    #[validate(length(min = 1, message = "Client id cannot be empty"))]
    pub client_id: String,

    /// Operator client secret
    pub client_secret: SecretString,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            uri: "https://vault.local".to_string(),
            client_id: "vaultsync".to_string(),
            client_secret: SecretString::new("change-me"),
        }
    }
}

impl ConnectionSettings {
    pub fn new(
        uri: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        Self { uri: uri.into(), client_id: client_id.into(), client_secret: client_secret.into() }
    }

    /// Read settings from the data map of the operator settings secret.
    pub fn from_secret_data(data: &BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let value = |key: &str| -> Result<Option<String>> {
            match data.get(key).filter(|v| !v.is_empty()) {
                Some(bytes) => String::from_utf8(bytes.clone()).map(Some).map_err(|e| {
                    let message = format!("{} is not valid UTF-8", key);
                    SyncError::config_with_source(message, Box::new(e))
                }),
                None => Ok(None),
            }
        };

        let uri = value(SETTINGS_URI_KEY)?.ok_or_else(|| SyncError::config("uri is missing"))?;
        let (client_id, client_secret) =
            match (value(SETTINGS_CLIENT_ID_KEY)?, value(SETTINGS_CLIENT_SECRET_KEY)?) {
                (Some(id), Some(secret)) => (id, secret),
                _ => return Err(SyncError::config("client credentials are missing")),
            };

        Ok(Self::new(uri, client_id, client_secret))
    }

    /// Read settings from `VAULTSYNC_URI`, `VAULTSYNC_CLIENT_ID` and `VAULTSYNC_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| SyncError::config(format!("{} is not set", name)))
        };

        Ok(Self::new(
            var("VAULTSYNC_URI")?,
            var("VAULTSYNC_CLIENT_ID")?,
            var("VAULTSYNC_CLIENT_SECRET")?,
        ))
    }
}

/// Lifetimes of the three caches fronting the vault
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Policy set TTL in seconds
    #[validate(range(min = 1, message = "Policy TTL must be at least 1 second"))]
    pub policy_ttl_seconds: u64,

    /// Client TTL in seconds
    #[validate(range(min = 1, message = "Client TTL must be at least 1 second"))]
    pub client_ttl_seconds: u64,

    /// Record index TTL in seconds
    #[validate(range(min = 1, message = "Index TTL must be at least 1 second"))]
    pub index_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy_ttl_seconds: 2 * 60 * 60, // 2 hours
            client_ttl_seconds: 10 * 60,
            index_ttl_seconds: 10 * 60,
        }
    }
}

impl CacheConfig {
    pub fn policy_ttl(&self) -> Duration {
        Duration::from_secs(self.policy_ttl_seconds)
    }

    pub fn client_ttl(&self) -> Duration {
        Duration::from_secs(self.client_ttl_seconds)
    }

    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.index_ttl_seconds)
    }

    /// Create CacheConfig from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let seconds = |name: &str, default: u64| {
            std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default)
        };

        Self {
            policy_ttl_seconds: seconds(
                "VAULTSYNC_POLICY_CACHE_TTL_SECONDS",
                defaults.policy_ttl_seconds,
            ),
            client_ttl_seconds: seconds(
                "VAULTSYNC_CLIENT_CACHE_TTL_SECONDS",
                defaults.client_ttl_seconds,
            ),
            index_ttl_seconds: seconds(
                "VAULTSYNC_INDEX_CACHE_TTL_SECONDS",
                defaults.index_ttl_seconds,
            ),
        }
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Service name attached to logs
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Prometheus exporter port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "vaultsync".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
            enable_metrics: true,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if !self.enable_metrics || self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }

    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            std::env::var(name).map(|s| s.to_lowercase() == "true" || s == "1").unwrap_or(default)
        };

        Self {
            service_name: std::env::var("VAULTSYNC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: std::env::var("VAULTSYNC_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: flag("VAULTSYNC_JSON_LOGGING", defaults.json_logging),
            enable_metrics: flag("VAULTSYNC_ENABLE_METRICS", defaults.enable_metrics),
            metrics_port: std::env::var("VAULTSYNC_METRICS_PORT")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(defaults.metrics_port),
        }
    }
}
