//! Strategy seam for the per-type secret assembly.
//!
//! Every secret type has one strategy. A strategy receives the request's key
//! references, a working copy of the request status and a working copy of the
//! target secret; the builder commits both only when the strategy succeeds.

use super::hash::ContentHasher;
use crate::domain::{
    Record, RecordIndexEntry, RecordId, SecretKeyReference, SecretType, TargetSecret,
    VaultSecretStatus,
};
use crate::errors::{Result, SyncError};
use crate::vault::VaultClient;
use async_trait::async_trait;
use std::collections::hash_map::{Entry, HashMap};
use tracing::{debug, warn};

/// What a strategy does when a referenced record is not in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRecord {
    /// Log and leave the key as it is
    Skip,
    /// Abort the build with [`SyncError::RecordNotFound`]
    Fail,
}

/// Everything a strategy may read during one build.
pub struct BuildContext<'a> {
    pub(crate) request: &'a str,
    pub(crate) index: &'a HashMap<RecordId, RecordIndexEntry>,
    pub(crate) client: &'a VaultClient,
    pub(crate) hasher: ContentHasher,
}

impl<'a> BuildContext<'a> {
    /// Index entry for a reference, applying the missing-record policy
    pub fn entry(
        &self,
        reference: &SecretKeyReference,
        missing: MissingRecord,
    ) -> Result<Option<&'a RecordIndexEntry>> {
        match self.index.get(&reference.record) {
            Some(entry) => Ok(Some(entry)),
            None if missing == MissingRecord::Skip => {
                warn!(
                    request = %self.request,
                    key = %reference.name,
                    record = %reference.record,
                    "Referenced record not found, skipping key"
                );
                Ok(None)
            }
            None => Err(SyncError::record_not_found(reference.record.as_str(), &reference.name)),
        }
    }

    /// Fetch the full record behind an index entry
    pub async fn fetch(&self, entry: &RecordIndexEntry) -> Result<Record> {
        debug!(request = %self.request, record = %entry.record.uuid, "Fetching record");
        self.client.fetch_record(entry).await
    }

    /// Fetch a record unless this build already holds it
    pub async fn fetch_once<'m>(
        &self,
        fetched: &'m mut HashMap<RecordId, Record>,
        entry: &RecordIndexEntry,
    ) -> Result<&'m Record> {
        match fetched.entry(entry.record.uuid.clone()) {
            Entry::Occupied(held) => Ok(held.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(self.fetch(entry).await?)),
        }
    }

    /// A record changed if it was never synced or was modified since
    pub fn record_changed(&self, status: &VaultSecretStatus, entry: &RecordIndexEntry) -> bool {
        match status.record_status(&entry.record.uuid) {
            Some(synced) => entry.record.last_modified_at > synced.last_modified_at,
            None => true,
        }
    }

    /// A key changed if it was never synced or the target's bytes no longer
    /// match the stored hash
    pub fn key_changed(
        &self,
        status: &VaultSecretStatus,
        target: &TargetSecret,
        key: &str,
    ) -> bool {
        match (status.key_status(key), target.get(key)) {
            (Some(synced), Some(value)) => !self.hasher.verify(value, &synced.hash),
            _ => true,
        }
    }

    /// Write a key and record its hash
    pub fn put(
        &self,
        status: &mut VaultSecretStatus,
        target: &mut TargetSecret,
        key: &str,
        value: Vec<u8>,
    ) -> Result<()> {
        let hash = self.hasher.hash(&value)?;
        status.set_key_status(key, hash);
        target.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }
}

/// Assembles the payload of one secret type.
#[async_trait]
pub trait SecretStrategy: Send + Sync {
    /// Missing-record policy of this strategy
    fn missing_record(&self) -> MissingRecord;

    async fn apply(
        &self,
        ctx: &BuildContext<'_>,
        references: &[SecretKeyReference],
        status: &mut VaultSecretStatus,
        target: &mut TargetSecret,
    ) -> Result<()>;
}

/// Strategy for a secret type; unknown types assemble like opaque secrets.
pub fn strategy_for(secret_type: &SecretType) -> &'static dyn SecretStrategy {
    match secret_type {
        SecretType::BasicAuth => &super::basic_auth::BasicAuthStrategy,
        SecretType::SshAuth => &super::ssh_auth::SshAuthStrategy,
        SecretType::Tls => &super::tls::TlsStrategy,
        SecretType::ApacheHtpasswd => &super::htpasswd::HtpasswdStrategy,
        SecretType::Opaque | SecretType::Other(_) => &super::opaque::OpaqueStrategy,
    }
}

/// Whether the status tracks records that are no longer referenced
pub(crate) fn references_removed(
    status: &VaultSecretStatus,
    references: &[SecretKeyReference],
) -> bool {
    status
        .vault_record_statuses
        .iter()
        .any(|synced| !references.iter().any(|r| r.record == synced.record_id))
}

/// Fails unless exactly `expected` references are declared
pub(crate) fn expect_references(
    secret_type: &SecretType,
    references: &[SecretKeyReference],
    expected: usize,
) -> Result<()> {
    if references.len() != expected {
        return Err(SyncError::invalid_request(
            secret_type.as_str(),
            format!("expected {} key reference(s), found {}", expected, references.len()),
        ));
    }
    Ok(())
}
