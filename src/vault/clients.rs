//! Client cache: one connected vault client per credential identity.

use super::client::{VaultClient, VaultConnector};
use crate::cache::TtlCache;
use crate::domain::{ClientCredentials, CredentialIdentity};
use crate::errors::Result;
use crate::observability::ApiMetrics;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Caches connected clients; construction runs the version probe, and a
/// failed construction is returned to the caller without being cached.
#[derive(Clone)]
pub struct ClientCache {
    cache: TtlCache<CredentialIdentity, Arc<VaultClient>>,
    connector: Arc<dyn VaultConnector>,
    uri: String,
    metrics: ApiMetrics,
}

impl fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCache")
            .field("uri", &self.uri)
            .field("entries", &self.cache.len())
            .field("ttl", &self.cache.ttl())
            .finish()
    }
}

impl ClientCache {
    pub fn new(
        connector: Arc<dyn VaultConnector>,
        uri: impl Into<String>,
        metrics: ApiMetrics,
        ttl: Duration,
    ) -> Self {
        Self { cache: TtlCache::new("clients", ttl), connector, uri: uri.into(), metrics }
    }

    /// Client for `credentials`, connecting on first use
    pub async fn get(&self, credentials: &ClientCredentials) -> Result<Arc<VaultClient>> {
        self.cache
            .get_or_try_load(credentials.client_id.clone(), || async {
                let client = VaultClient::connect(
                    self.connector.as_ref(),
                    &self.uri,
                    credentials,
                    self.metrics.clone(),
                )
                .await?;
                Ok(Arc::new(client))
            })
            .await
    }

    pub fn invalidate(&self, client_id: &CredentialIdentity) {
        self.cache.invalidate(client_id);
    }

    pub fn flush(&self) {
        self.cache.flush();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
