//! Apache htpasswd secrets: one `users` key with a line per record.

use super::strategy::{references_removed, BuildContext, MissingRecord, SecretStrategy};
use crate::domain::{
    Record, RecordId, SecretKeyReference, SecretType, TargetSecret, VaultSecretStatus,
};
use crate::errors::{Result, SyncError};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

pub const USERS_KEY: &str = "users";

pub struct HtpasswdStrategy;

#[async_trait]
impl SecretStrategy for HtpasswdStrategy {
    fn missing_record(&self) -> MissingRecord {
        MissingRecord::Fail
    }

    async fn apply(
        &self,
        ctx: &BuildContext<'_>,
        references: &[SecretKeyReference],
        status: &mut VaultSecretStatus,
        target: &mut TargetSecret,
    ) -> Result<()> {
        if references.is_empty() {
            return Err(SyncError::invalid_request(
                SecretType::APACHE_HTPASSWD,
                "expected at least one key reference",
            ));
        }

        let mut entries = Vec::with_capacity(references.len());
        for reference in references {
            if let Some(entry) = ctx.entry(reference, self.missing_record())? {
                entries.push(entry);
            }
        }

        let changed = entries.iter().any(|entry| ctx.record_changed(status, entry))
            || ctx.key_changed(status, target, USERS_KEY)
            || references_removed(status, references);
        if !changed {
            debug!(request = %ctx.request, "No changes detected");
            return Ok(());
        }

        status.clear();
        let mut users = String::new();
        let mut fetched: HashMap<RecordId, Record> = HashMap::new();
        for entry in entries {
            let record = ctx.fetch_once(&mut fetched, entry).await?;
            if record.username().is_empty() {
                return Err(SyncError::missing_field(record.uuid.as_str(), "Username"));
            }
            if record.password().is_empty() {
                return Err(SyncError::missing_field(record.uuid.as_str(), "Password"));
            }

            let hash = ctx.hasher().bcrypt_password(record.password())?;
            users.push_str(&format!("{}:{}\n", record.username(), hash));
            status.set_record_status(record);
        }

        target.data.clear();
        ctx.put(status, target, USERS_KEY, users.into_bytes())
    }
}
