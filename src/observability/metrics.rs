//! # Metrics Collection
//!
//! Counters for vault API usage and reconciliation outcomes, published through
//! the `metrics` facade. The optional Prometheus exporter serves them over HTTP.

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use dashmap::DashMap;
use metrics::{counter, describe_counter, Unit};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Counter of upstream vault calls, labeled by resource and verb
pub const VAULT_API_REQUESTS_TOTAL: &str = "vault_api_requests_total";
/// Counter of reconciliation passes, labeled by status and reason
pub const SYNC_RESULTS_TOTAL: &str = "sync_results_total";

/// One kind of upstream vault call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultCall {
    ListGroups,
    ListRecords,
    GetRecord,
    Version,
}

impl VaultCall {
    pub const ALL: [VaultCall; 4] =
        [VaultCall::ListGroups, VaultCall::ListRecords, VaultCall::GetRecord, VaultCall::Version];

    pub fn resource(&self) -> &'static str {
        match self {
            Self::ListGroups => "group",
            Self::ListRecords | Self::GetRecord => "vault",
            Self::Version => "version",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::ListGroups | Self::ListRecords => "list",
            Self::GetRecord | Self::Version => "get",
        }
    }
}

impl fmt::Display for VaultCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource(), self.verb())
    }
}

/// Vault API call counter.
///
/// Every increment is forwarded to the global `metrics` recorder and also
/// kept in-process, so callers (and tests) can read exact call counts
/// without scraping an exporter. Clones share the same counts.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    counts: Arc<DashMap<VaultCall, u64>>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one upstream call
    pub fn record(&self, call: VaultCall) {
        counter!(
            VAULT_API_REQUESTS_TOTAL,
            "resource" => call.resource(),
            "verb" => call.verb()
        )
        .increment(1);
        *self.counts.entry(call).or_insert(0) += 1;
    }

    /// Calls recorded for one call kind
    pub fn count(&self, call: VaultCall) -> u64 {
        self.counts.get(&call).map(|c| *c).unwrap_or(0)
    }

    /// Calls recorded across all kinds
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }
}

/// Record the outcome of one reconciliation pass
pub fn record_sync_result(status: &str, reason: &str) {
    counter!(SYNC_RESULTS_TOTAL, "status" => status.to_string(), "reason" => reason.to_string())
        .increment(1);
}

/// Describe the crate's metrics and register the vault call series at zero,
/// so exports show them before the first call.
pub fn register_metrics() {
    describe_counter!(
        VAULT_API_REQUESTS_TOTAL,
        Unit::Count,
        "Vault API requests issued, by resource and verb"
    );
    describe_counter!(SYNC_RESULTS_TOTAL, Unit::Count, "Reconciliation passes by outcome");

    for call in VaultCall::ALL {
        counter!(VAULT_API_REQUESTS_TOTAL, "resource" => call.resource(), "verb" => call.verb())
            .absolute(0);
    }
}

/// Initialize metrics collection and the Prometheus exporter
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    use crate::errors::SyncError;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            tracing::warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        SyncError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| SyncError::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    register_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Register metric descriptions; the embedding application owns the recorder
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if config.enable_metrics {
        register_metrics();
        info!(service_name = %config.service_name, "Metrics descriptions registered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_call_labels() {
        assert_eq!(VaultCall::ListGroups.to_string(), "group/list");
        assert_eq!(VaultCall::ListRecords.to_string(), "vault/list");
        assert_eq!(VaultCall::GetRecord.to_string(), "vault/get");
        assert_eq!(VaultCall::Version.to_string(), "version/get");
    }

    #[test]
    fn test_api_metrics_counts() {
        let metrics = ApiMetrics::new();
        metrics.record(VaultCall::GetRecord);
        metrics.record(VaultCall::GetRecord);
        metrics.record(VaultCall::ListGroups);

        assert_eq!(metrics.count(VaultCall::GetRecord), 2);
        assert_eq!(metrics.count(VaultCall::ListGroups), 1);
        assert_eq!(metrics.count(VaultCall::Version), 0);
        assert_eq!(metrics.total(), 3);
    }

    #[test]
    fn test_api_metrics_clones_share_counts() {
        let metrics = ApiMetrics::new();
        let clone = metrics.clone();
        clone.record(VaultCall::Version);
        assert_eq!(metrics.count(VaultCall::Version), 1);
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_sync_result("Synced", "SecretUpdated");
        register_metrics();
    }
}
