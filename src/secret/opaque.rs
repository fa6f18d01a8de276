//! Opaque secrets: one output key per reference.

use super::strategy::{BuildContext, MissingRecord, SecretStrategy};
use crate::domain::{Record, RecordId, SecretKeyReference, TargetSecret, VaultSecretStatus};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::SecondsFormat;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

pub struct OpaqueStrategy;

/// Record field an opaque key is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Username,
    Password,
    BcryptPassword,
    Url,
    File,
    LastModifiedAt,
}

impl Property {
    /// `None` for properties a record does not carry
    fn of(reference: &SecretKeyReference) -> Option<Self> {
        let property = match reference.property.as_str() {
            "username" => Self::Username,
            "" | "password" if reference.wants_bcrypt() => Self::BcryptPassword,
            "" | "password" => Self::Password,
            "link" | "url" => Self::Url,
            "file" => Self::File,
            "lastModifiedAt" => Self::LastModifiedAt,
            _ => return None,
        };
        Some(property)
    }

    fn value(self, ctx: &BuildContext<'_>, record: &Record) -> Result<Vec<u8>> {
        let value = match self {
            Self::Username => record.username().as_bytes().to_vec(),
            Self::Password => record.password().as_bytes().to_vec(),
            Self::BcryptPassword => ctx.hasher().bcrypt_password(record.password())?.into_bytes(),
            Self::Url => record.url().as_bytes().to_vec(),
            Self::File => record.file().map(<[u8]>::to_vec).unwrap_or_default(),
            Self::LastModifiedAt => record
                .last_modified_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
                .into_bytes(),
        };
        Ok(value)
    }
}

#[async_trait]
impl SecretStrategy for OpaqueStrategy {
    fn missing_record(&self) -> MissingRecord {
        MissingRecord::Skip
    }

    async fn apply(
        &self,
        ctx: &BuildContext<'_>,
        references: &[SecretKeyReference],
        status: &mut VaultSecretStatus,
        target: &mut TargetSecret,
    ) -> Result<()> {
        let records: HashSet<&RecordId> = references.iter().map(|r| &r.record).collect();
        let keys: HashSet<&str> = references.iter().map(|r| r.name.as_str()).collect();
        for key in status.retain(&records, &keys) {
            debug!(request = %ctx.request, key = %key, "Removing obsolete key");
            target.data.remove(&key);
        }

        let mut wanted = Vec::with_capacity(references.len());
        for reference in references {
            let Some(property) = Property::of(reference) else {
                warn!(
                    request = %ctx.request,
                    key = %reference.name,
                    property = %reference.property,
                    "Unsupported property, skipping key"
                );
                continue;
            };
            if let Some(entry) = ctx.entry(reference, self.missing_record())? {
                wanted.push((reference, property, entry));
            }
        }

        // Judged against the incoming status; keys sharing a record must all
        // see the record as changed.
        let changed_records: HashSet<&RecordId> = wanted
            .iter()
            .filter(|&&(_, _, entry)| ctx.record_changed(status, entry))
            .map(|&(_, _, entry)| &entry.record.uuid)
            .collect();

        let mut fetched: HashMap<RecordId, Record> = HashMap::new();
        for (reference, property, entry) in wanted {
            let changed = changed_records.contains(&entry.record.uuid)
                || ctx.key_changed(status, target, &reference.name);
            if !changed {
                debug!(request = %ctx.request, key = %reference.name, "No changes detected");
                continue;
            }

            let record = ctx.fetch_once(&mut fetched, entry).await?;
            let value = property.value(ctx, record)?;
            status.set_record_status(record);
            ctx.put(status, target, &reference.name, value)?;
        }

        Ok(())
    }
}
