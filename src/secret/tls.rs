//! TLS secrets
//!
//! Either one bundle reference (`pem` or `pkcs12`) or separate `tls.key`,
//! `tls.crt` and optional `ca.crt` references. The output is always exactly
//! `tls.crt` (leaf and chain) and `tls.key`, plus certificate annotations.

use super::strategy::{references_removed, BuildContext, MissingRecord, SecretStrategy};
use crate::domain::{
    Record, RecordId, RecordIndexEntry, SecretKeyReference, SecretType, TargetSecret,
    VaultSecretStatus,
};
use crate::errors::{Result, SyncError, TlsError};
use crate::utils::CertificateBundle;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

pub const CERTIFICATE_KEY: &str = "tls.crt";
pub const PRIVATE_KEY: &str = "tls.key";
pub const CA_KEY: &str = "ca.crt";
pub const PEM_BUNDLE: &str = "pem";
pub const PKCS12_BUNDLE: &str = "pkcs12";

pub struct TlsStrategy;

fn invalid(message: impl Into<String>) -> SyncError {
    SyncError::invalid_request(SecretType::TLS, message)
}

fn file(record: &Record) -> Result<&[u8]> {
    record
        .file()
        .ok_or_else(|| TlsError::MissingFile { record: record.uuid.to_string() }.into())
}

/// References of the separate-records layout
struct Parts<'r> {
    key: &'r SecretKeyReference,
    certificate: &'r SecretKeyReference,
    ca: Option<&'r SecretKeyReference>,
}

impl<'r> Parts<'r> {
    fn from_references(references: &'r [SecretKeyReference]) -> Result<Self> {
        let mut key: Option<&'r SecretKeyReference> = None;
        let mut certificate: Option<&'r SecretKeyReference> = None;
        let mut ca: Option<&'r SecretKeyReference> = None;
        for reference in references {
            let slot = match reference.name.as_str() {
                PRIVATE_KEY => &mut key,
                CERTIFICATE_KEY => &mut certificate,
                CA_KEY => &mut ca,
                other => return Err(invalid(format!("unexpected key '{}'", other))),
            };
            if slot.replace(reference).is_some() {
                return Err(invalid(format!("duplicate key '{}'", reference.name)));
            }
        }

        Ok(Self {
            key: key.ok_or_else(|| invalid(format!("missing key '{}'", PRIVATE_KEY)))?,
            certificate: certificate
                .ok_or_else(|| invalid(format!("missing key '{}'", CERTIFICATE_KEY)))?,
            ca,
        })
    }

    /// Fetch order: key, certificate, CA
    fn in_fetch_order(&self) -> impl Iterator<Item = &'r SecretKeyReference> {
        [Some(self.key), Some(self.certificate), self.ca].into_iter().flatten()
    }
}

impl TlsStrategy {
    fn changed(
        &self,
        ctx: &BuildContext<'_>,
        entries: &[&RecordIndexEntry],
        references: &[SecretKeyReference],
        status: &VaultSecretStatus,
        target: &TargetSecret,
    ) -> bool {
        entries.iter().any(|entry| ctx.record_changed(status, entry))
            || ctx.key_changed(status, target, CERTIFICATE_KEY)
            || ctx.key_changed(status, target, PRIVATE_KEY)
            || references_removed(status, references)
    }

    async fn load_bundle(
        &self,
        ctx: &BuildContext<'_>,
        reference: &SecretKeyReference,
        entry: &RecordIndexEntry,
    ) -> Result<(CertificateBundle, Vec<Record>)> {
        let record = ctx.fetch(entry).await?;
        let bundle = match reference.name.as_str() {
            PEM_BUNDLE => CertificateBundle::from_pem(file(&record)?)?,
            _ => CertificateBundle::from_pkcs12(file(&record)?, record.password())?,
        };
        Ok((bundle, vec![record]))
    }

    async fn load_parts(
        &self,
        ctx: &BuildContext<'_>,
        entries: &[&RecordIndexEntry],
    ) -> Result<(CertificateBundle, Vec<Record>)> {
        let mut fetched: HashMap<RecordId, Record> = HashMap::new();
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(ctx.fetch_once(&mut fetched, entry).await?.clone());
        }

        let ca = match records.get(2) {
            Some(record) => Some(file(record)?),
            None => None,
        };
        let bundle = CertificateBundle::from_parts(file(&records[0])?, file(&records[1])?, ca)?;
        Ok((bundle, records))
    }
}

#[async_trait]
impl SecretStrategy for TlsStrategy {
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
        let ordered: Vec<&SecretKeyReference> = match references.len() {
            1 => {
                let name = references[0].name.as_str();
                if name != PEM_BUNDLE && name != PKCS12_BUNDLE {
                    return Err(invalid(format!(
                        "invalid name '{}', only '{}' or '{}' is allowed for a single key",
                        name, PEM_BUNDLE, PKCS12_BUNDLE
                    )));
                }
                vec![&references[0]]
            }
            2 | 3 => Parts::from_references(references)?.in_fetch_order().collect(),
            n => return Err(invalid(format!("unexpected number of keys, found {}", n))),
        };

        let mut entries = Vec::with_capacity(ordered.len());
        for reference in &ordered {
            if let Some(entry) = ctx.entry(reference, self.missing_record())? {
                entries.push(entry);
            }
        }

        if !self.changed(ctx, &entries, references, status, target) {
            debug!(request = %ctx.request, "No changes detected");
            return Ok(());
        }

        let (bundle, records) = if ordered.len() == 1 {
            self.load_bundle(ctx, ordered[0], entries[0]).await?
        } else {
            self.load_parts(ctx, &entries).await?
        };

        let certificate = bundle.certificate_pem().into_bytes();
        let private_key = bundle.private_key_pem()?.into_bytes();
        let info = bundle.info()?;

        status.clear();
        for record in &records {
            status.set_record_status(record);
        }
        target.data.clear();
        ctx.put(status, target, CERTIFICATE_KEY, certificate)?;
        ctx.put(status, target, PRIVATE_KEY, private_key)?;
        target.metadata.annotations.extend(info.annotations());

        info!(
            request = %ctx.request,
            cn = %info.common_name,
            expires_at = %info.not_after,
            chain = bundle.chain.len(),
            "TLS material assembled"
        );
        Ok(())
    }
}
