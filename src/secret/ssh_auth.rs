//! SSH authentication secrets: the private key file of one record.

use super::strategy::{expect_references, BuildContext, MissingRecord, SecretStrategy};
use crate::domain::{SecretKeyReference, SecretType, TargetSecret, VaultSecretStatus};
use crate::errors::{Result, SyncError};
use async_trait::async_trait;
use tracing::debug;

/// Required reference name
pub const REFERENCE_NAME: &str = "key";
pub const PRIVATE_KEY: &str = "ssh-privatekey";

pub struct SshAuthStrategy;

#[async_trait]
impl SecretStrategy for SshAuthStrategy {
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
        expect_references(&SecretType::SshAuth, references, 1)?;
        let reference = &references[0];
        if reference.name != REFERENCE_NAME {
            return Err(SyncError::invalid_request(
                SecretType::SSH_AUTH,
                format!("invalid name '{}', only '{}' is allowed", reference.name, REFERENCE_NAME),
            ));
        }
        let Some(entry) = ctx.entry(reference, self.missing_record())? else { return Ok(()) };

        if !ctx.record_changed(status, entry) && !ctx.key_changed(status, target, PRIVATE_KEY) {
            debug!(request = %ctx.request, "No changes detected");
            return Ok(());
        }

        let record = ctx.fetch(entry).await?;
        let key = record
            .file()
            .ok_or_else(|| SyncError::missing_field(reference.record.as_str(), "File"))?
            .to_vec();

        target.data.clear();
        status.clear();
        status.set_record_status(&record);
        ctx.put(status, target, PRIVATE_KEY, key)
    }
}
