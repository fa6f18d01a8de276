//! Vault index cache
//!
//! Per credential identity, a flattened map from record id to the record's
//! summary and group. Rebuilt by listing every group and then every group's
//! records; no decrypted material is fetched.

use super::client::VaultClient;
use crate::cache::TtlCache;
use crate::domain::{CredentialIdentity, RecordIndex, RecordIndexEntry};
use crate::errors::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct VaultIndexCache {
    cache: TtlCache<CredentialIdentity, RecordIndex>,
}

impl VaultIndexCache {
    pub fn new(ttl: Duration) -> Self {
        Self { cache: TtlCache::new("vault_index", ttl) }
    }

    /// Record index visible to `client`
    pub async fn get(&self, client: &VaultClient) -> Result<RecordIndex> {
        self.cache
            .get_or_try_load(client.client_id().clone(), || build_index(client))
            .await
    }

    pub fn invalidate(&self, client_id: &CredentialIdentity) {
        self.cache.invalidate(client_id);
    }

    pub fn flush(&self) {
        self.cache.flush();
    }
}

async fn build_index(client: &VaultClient) -> Result<RecordIndex> {
    let groups = client.list_groups().await?;

    let mut index = HashMap::new();
    for group in groups {
        let records = client.list_records(&group).await?;
        for record in records {
            debug!(
                group = %group.uuid,
                record = %record.uuid,
                name = %record.name,
                "Found vault record"
            );
            index.insert(record.uuid.clone(), RecordIndexEntry { group: group.clone(), record });
        }
    }

    info!(client_id = %client.client_id(), records = index.len(), "Vault index built");
    Ok(Arc::new(index))
}
