//! Basic authentication secrets: `username` and `password` from one record.

use super::strategy::{expect_references, BuildContext, MissingRecord, SecretStrategy};
use crate::domain::{SecretKeyReference, SecretType, TargetSecret, VaultSecretStatus};
use crate::errors::{Result, SyncError};
use async_trait::async_trait;
use tracing::debug;

pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

pub struct BasicAuthStrategy;

#[async_trait]
impl SecretStrategy for BasicAuthStrategy {
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
        expect_references(&SecretType::BasicAuth, references, 1)?;
        let reference = &references[0];
        let Some(entry) = ctx.entry(reference, self.missing_record())? else { return Ok(()) };

        let changed = ctx.record_changed(status, entry)
            || ctx.key_changed(status, target, USERNAME_KEY)
            || ctx.key_changed(status, target, PASSWORD_KEY);
        if !changed {
            debug!(request = %ctx.request, "No changes detected");
            return Ok(());
        }

        let record = ctx.fetch(entry).await?;
        if record.username().is_empty() {
            return Err(SyncError::missing_field(reference.record.as_str(), "Username"));
        }
        if record.password().is_empty() {
            return Err(SyncError::missing_field(reference.record.as_str(), "Password"));
        }

        target.data.clear();
        status.clear();
        status.set_record_status(&record);
        ctx.put(status, target, USERNAME_KEY, record.username().as_bytes().to_vec())?;
        ctx.put(status, target, PASSWORD_KEY, record.password().as_bytes().to_vec())?;
        Ok(())
    }
}
