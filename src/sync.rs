//! # Reconciliation
//!
//! [`SecretSynchronizer`] runs one full pass for a request object: resolve
//! the vault client through the policy engine, look up that client's record
//! index, and build the target secret. The outcome carries the sync status
//! written to the request and the event to report for it.

use crate::config::AppConfig;
use crate::domain::{SyncStatus, TargetSecret, VaultSecret};
use crate::errors::Result;
use crate::observability::{record_sync_result, ApiMetrics};
use crate::policy::{
    NamespaceLister, NamespacePolicyResolver, PolicyCache, PolicyEngine, PolicyLoader,
};
use crate::secret::{ContentHasher, SecretBuilder};
use crate::sync_span;
use crate::vault::{ClientCache, VaultConnector, VaultIndexCache};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Machine readable reason of a reconciliation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
    SecretCreated,
    SecretUpdated,
    ProcessingError,
}

impl SyncReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecretCreated => "SecretCreated",
            Self::SecretUpdated => "SecretUpdated",
            Self::ProcessingError => "ProcessingError",
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::ProcessingError)
    }
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event to report on the request object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    pub reason: SyncReason,
    pub message: String,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    /// `None` when the target did not change
    pub event: Option<SyncEvent>,
}

/// Drives reconciliations over shared caches.
///
/// Cloning is cheap; clones share the policy, client and index caches.
#[derive(Debug, Clone)]
pub struct SecretSynchronizer {
    engine: PolicyEngine,
    index: VaultIndexCache,
    hasher: ContentHasher,
}

impl SecretSynchronizer {
    pub fn new(engine: PolicyEngine, index: VaultIndexCache) -> Self {
        Self { engine, index, hasher: ContentHasher::default() }
    }

    /// Wire the policy, client and index caches from configuration.
    ///
    /// Every vault call, including policy discovery, is counted on one
    /// shared [`ApiMetrics`].
    pub fn from_config(
        config: &AppConfig,
        connector: Arc<dyn VaultConnector>,
        namespaces: Arc<dyn NamespaceLister>,
    ) -> Self {
        let metrics = ApiMetrics::new();
        let loader =
            PolicyLoader::new(config.vault.clone(), Arc::clone(&connector), metrics.clone());
        let engine = PolicyEngine::new(
            PolicyCache::new(Arc::new(loader), config.cache.policy_ttl()),
            NamespacePolicyResolver::new(namespaces),
            ClientCache::new(connector, &config.vault.uri, metrics, config.cache.client_ttl()),
        );
        Self::new(engine, VaultIndexCache::new(config.cache.index_ttl()))
    }

    pub fn with_hasher(mut self, hasher: ContentHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Reconcile `request` into `target`.
    ///
    /// On failure the request is marked out of sync, the target is left as
    /// it was, and the error message becomes a warning event.
    pub async fn reconcile(
        &self,
        request: &mut VaultSecret,
        target: &mut TargetSecret,
    ) -> SyncOutcome {
        let span = sync_span!(request.namespace(), request.name());
        let created = target.secret_type.is_none();
        let before = target.clone();

        let result = self.sync(request, target).instrument(span.clone()).await;
        let _entered = span.enter();

        let outcome = match result {
            Ok(()) => {
                request.status.sync = if request.status.secret_key_statuses.is_empty() {
                    SyncStatus::Unknown
                } else {
                    SyncStatus::Synced
                };
                let event = if *target == before {
                    None
                } else if created {
                    Some(SyncEvent {
                        reason: SyncReason::SecretCreated,
                        message: format!(
                            "Secret (type '{}') has been created",
                            target.secret_type.clone().unwrap_or_default()
                        ),
                    })
                } else {
                    Some(SyncEvent {
                        reason: SyncReason::SecretUpdated,
                        message: "Secret has been updated".to_string(),
                    })
                };
                info!(
                    status = %request.status.sync,
                    changed = event.is_some(),
                    "Reconciliation finished"
                );
                SyncOutcome { status: request.status.sync, event }
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Sync failed");
                request.status.sync = SyncStatus::OutOfSync;
                SyncOutcome {
                    status: SyncStatus::OutOfSync,
                    event: Some(SyncEvent {
                        reason: SyncReason::ProcessingError,
                        message: e.to_string(),
                    }),
                }
            }
        };

        let reason = outcome.event.as_ref().map_or("Unchanged", |event| event.reason.as_str());
        record_sync_result(outcome.status.as_str(), reason);
        outcome
    }

    async fn sync(&self, request: &mut VaultSecret, target: &mut TargetSecret) -> Result<()> {
        let client = self.engine.get_client(request).await?;
        let index = self.index.get(&client).await?;
        SecretBuilder::new(index, client).with_hasher(self.hasher).build(request, target).await
    }
}
