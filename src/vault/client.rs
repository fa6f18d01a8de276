//! Vault API traits and the metered client
//!
//! The transport is pluggable: [`VaultApi`] is one authenticated session and
//! [`VaultConnector`] opens sessions for a set of client credentials.
//! [`VaultClient`] wraps a session and counts every upstream call.

use crate::domain::{
    ClientCredentials, CredentialIdentity, Group, Record, RecordId, RecordIndexEntry,
    RecordOptions, RecordSummary,
};
use crate::errors::Result;
use crate::observability::{ApiMetrics, VaultCall};
use crate::vault_span;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, Instrument};

/// One authenticated session against the vault API.
///
/// Implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Server version; doubles as the connectivity probe
    async fn version(&self) -> Result<String>;

    /// Groups visible to the session's credentials
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Record summaries of one group's vault
    async fn list_records(&self, group: &Group) -> Result<Vec<RecordSummary>>;

    /// Fetch one record, optionally with its decrypted secret and audit data
    async fn get_record(
        &self,
        group: &Group,
        record_id: &RecordId,
        options: RecordOptions,
    ) -> Result<Record>;
}

/// Opens [`VaultApi`] sessions.
#[async_trait]
pub trait VaultConnector: Send + Sync {
    /// Create a session for `credentials` against the vault at `uri`
    async fn connect(&self, uri: &str, credentials: &ClientCredentials)
        -> Result<Arc<dyn VaultApi>>;
}

/// A connected vault session that records every upstream call.
#[derive(Clone)]
pub struct VaultClient {
    client_id: CredentialIdentity,
    server_version: String,
    api: Arc<dyn VaultApi>,
    metrics: ApiMetrics,
}

impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("client_id", &self.client_id)
            .field("server_version", &self.server_version)
            .finish()
    }
}

impl VaultClient {
    /// Open a session and probe the server version.
    ///
    /// A failing probe fails the whole construction.
    pub async fn connect(
        connector: &dyn VaultConnector,
        uri: &str,
        credentials: &ClientCredentials,
        metrics: ApiMetrics,
    ) -> Result<Self> {
        info!(uri = %uri, client_id = %credentials.client_id, "Creating vault client");
        let api = connector.connect(uri, credentials).await?;

        metrics.record(VaultCall::Version);
        let server_version = api
            .version()
            .instrument(vault_span!(VaultCall::Version.resource(), VaultCall::Version.verb()))
            .await?;
        info!(client_id = %credentials.client_id, version = %server_version, "Connected to vault");

        Ok(Self { client_id: credentials.client_id.clone(), server_version, api, metrics })
    }

    pub fn client_id(&self) -> &CredentialIdentity {
        &self.client_id
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn metrics(&self) -> &ApiMetrics {
        &self.metrics
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.metrics.record(VaultCall::ListGroups);
        self.api
            .list_groups()
            .instrument(vault_span!("group", "list", client_id = %self.client_id))
            .await
    }

    pub async fn list_records(&self, group: &Group) -> Result<Vec<RecordSummary>> {
        self.metrics.record(VaultCall::ListRecords);
        self.api
            .list_records(group)
            .instrument(vault_span!("vault", "list", group = %group.uuid))
            .await
    }

    pub async fn get_record(
        &self,
        group: &Group,
        record_id: &RecordId,
        options: RecordOptions,
    ) -> Result<Record> {
        self.metrics.record(VaultCall::GetRecord);
        self.api
            .get_record(group, record_id, options)
            .instrument(vault_span!("vault", "get", group = %group.uuid, record = %record_id))
            .await
    }

    /// Fetch the decrypted record behind an index entry
    pub async fn fetch_record(&self, entry: &RecordIndexEntry) -> Result<Record> {
        debug!(record = %entry.record.uuid, name = %entry.record.name, "Fetching vault record");
        self.get_record(&entry.group, &entry.record.uuid, RecordOptions::full()).await
    }
}
