//! In-process vault
//!
//! A complete [`VaultApi`]/[`VaultConnector`] implementation backed by memory.
//! It checks client credentials, scopes groups per client, supports record
//! updates and can simulate an outage. Used for local development and tests.

use super::client::{VaultApi, VaultConnector};
use crate::domain::{
    ClientCredentials, CredentialIdentity, Group, GroupId, Record, RecordId, RecordOptions,
    RecordSummary,
};
use crate::errors::{Result, SyncError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct VaultState {
    groups: Vec<Group>,
    records: HashMap<GroupId, Vec<Record>>,
    clients: HashMap<CredentialIdentity, String>,
    grants: HashMap<CredentialIdentity, HashSet<GroupId>>,
}

impl VaultState {
    fn find_record_mut(&mut self, record_id: &RecordId) -> Option<&mut Record> {
        self.records
            .values_mut()
            .flat_map(|records| records.iter_mut())
            .find(|r| &r.uuid == record_id)
    }

    fn visible_to(&self, client_id: &CredentialIdentity, group: &GroupId) -> bool {
        self.grants.get(client_id).map_or(true, |groups| groups.contains(group))
    }
}

#[derive(Debug)]
struct Shared {
    version: String,
    state: RwLock<VaultState>,
    unavailable: AtomicBool,
}

/// In-memory vault; clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryVault {
    shared: Arc<Shared>,
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new("in-memory-1")
    }
}

impl InMemoryVault {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                version: version.into(),
                state: RwLock::new(VaultState::default()),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Accept sessions for this client id and secret
    pub async fn register_client(&self, client_id: &str, client_secret: &str) {
        let mut state = self.shared.state.write().await;
        state.clients.insert(CredentialIdentity::new(client_id), client_secret.to_string());
    }

    /// Restrict a client to the given groups; clients without grants see every group
    pub async fn grant(&self, client_id: &str, group: &GroupId) {
        let mut state = self.shared.state.write().await;
        state.grants.entry(CredentialIdentity::new(client_id)).or_default().insert(group.clone());
    }

    pub async fn add_group(&self, group: Group) {
        let mut state = self.shared.state.write().await;
        state.records.entry(group.uuid.clone()).or_default();
        if !state.groups.iter().any(|g| g.uuid == group.uuid) {
            state.groups.push(group);
        }
    }

    /// Insert or replace a record in a group, creating the group entry if needed
    pub async fn put_record(&self, group: &GroupId, record: Record) {
        let mut state = self.shared.state.write().await;
        let records = state.records.entry(group.clone()).or_default();
        match records.iter_mut().find(|r| r.uuid == record.uuid) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Apply `update` to a record and advance its modification time.
    /// Returns false if the record does not exist.
    pub async fn update_record<F>(&self, record_id: &RecordId, update: F) -> bool
    where
        F: FnOnce(&mut Record),
    {
        let mut state = self.shared.state.write().await;
        match state.find_record_mut(record_id) {
            Some(record) => {
                update(record);
                record.last_modified_at =
                    record.last_modified_at.max(Utc::now()) + Duration::seconds(1);
                true
            }
            None => false,
        }
    }

    /// Advance a record's modification time without changing its content
    pub async fn touch_record(&self, record_id: &RecordId) -> bool {
        self.update_record(record_id, |_| {}).await
    }

    pub async fn remove_record(&self, record_id: &RecordId) -> bool {
        let mut state = self.shared.state.write().await;
        let mut removed = false;
        for records in state.records.values_mut() {
            let before = records.len();
            records.retain(|r| &r.uuid != record_id);
            removed |= records.len() != before;
        }
        removed
    }

    /// Make every call fail until set back to false
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::upstream(operation, "vault unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl VaultConnector for InMemoryVault {
    async fn connect(
        &self,
        uri: &str,
        credentials: &ClientCredentials,
    ) -> Result<Arc<dyn VaultApi>> {
        self.check_available("connect")?;
        let state = self.shared.state.read().await;
        match state.clients.get(&credentials.client_id) {
            Some(secret) if secret == credentials.client_secret.expose_secret() => {
                debug!(uri = %uri, client_id = %credentials.client_id, "In-memory session opened");
                Ok(Arc::new(InMemorySession {
                    vault: self.clone(),
                    client_id: credentials.client_id.clone(),
                }))
            }
            _ => Err(SyncError::upstream(
                "connect",
                format!("invalid credentials for client '{}'", credentials.client_id),
            )),
        }
    }
}

/// One client's session on an [`InMemoryVault`].
#[derive(Debug)]
struct InMemorySession {
    vault: InMemoryVault,
    client_id: CredentialIdentity,
}

#[async_trait]
impl VaultApi for InMemorySession {
    async fn version(&self) -> Result<String> {
        self.vault.check_available("version/get")?;
        Ok(self.vault.shared.version.clone())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        self.vault.check_available("group/list")?;
        let state = self.vault.shared.state.read().await;
        Ok(state
            .groups
            .iter()
            .filter(|g| state.visible_to(&self.client_id, &g.uuid))
            .cloned()
            .collect())
    }

    async fn list_records(&self, group: &Group) -> Result<Vec<RecordSummary>> {
        self.vault.check_available("vault/list")?;
        let state = self.vault.shared.state.read().await;
        if !state.visible_to(&self.client_id, &group.uuid) {
            return Err(SyncError::upstream(
                "vault/list",
                format!("access denied to group {}", group.uuid),
            ));
        }
        Ok(state
            .records
            .get(&group.uuid)
            .map(|records| records.iter().map(Record::summary).collect())
            .unwrap_or_default())
    }

    async fn get_record(
        &self,
        group: &Group,
        record_id: &RecordId,
        options: RecordOptions,
    ) -> Result<Record> {
        self.vault.check_available("vault/get")?;
        let state = self.vault.shared.state.read().await;
        if !state.visible_to(&self.client_id, &group.uuid) {
            return Err(SyncError::upstream(
                "vault/get",
                format!("access denied to group {}", group.uuid),
            ));
        }

        let mut record = state
            .records
            .get(&group.uuid)
            .and_then(|records| records.iter().find(|r| &r.uuid == record_id))
            .cloned()
            .ok_or_else(|| {
                SyncError::upstream("vault/get", format!("record {} does not exist", record_id))
            })?;

        if !options.secret {
            record.password = None;
            record.file = None;
        }
        Ok(record)
    }
}
