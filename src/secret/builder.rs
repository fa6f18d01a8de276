//! Secret builder
//!
//! Computes the target secret's labels, annotations, type and data from a
//! request, fetching only the records whose content may have changed. The
//! build runs on copies of the request status and the target; both are
//! replaced only when every step succeeds.

use super::hash::ContentHasher;
use super::strategy::{strategy_for, BuildContext};
use crate::domain::{RecordIndex, SecretType, TargetSecret, VaultSecret};
use crate::errors::{Result, SyncError};
use crate::vault::VaultClient;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Request labels copied onto the target secret
pub const STANDARD_LABELS: [&str; 7] = [
    "app.kubernetes.io/name",
    "app.kubernetes.io/instance",
    "app.kubernetes.io/version",
    "app.kubernetes.io/component",
    "app.kubernetes.io/part-of",
    "app.kubernetes.io/managed-by",
    "helm.sh/chart",
];

/// Builds target secrets from one client's record index.
#[derive(Debug, Clone)]
pub struct SecretBuilder {
    index: RecordIndex,
    client: Arc<VaultClient>,
    hasher: ContentHasher,
}

impl SecretBuilder {
    pub fn new(index: RecordIndex, client: Arc<VaultClient>) -> Self {
        Self { index, client, hasher: ContentHasher::default() }
    }

    pub fn with_hasher(mut self, hasher: ContentHasher) -> Self {
        self.hasher = hasher;
        self
    }

    #[instrument(skip_all, fields(request = %request.qualified_name()))]
    pub async fn build(&self, request: &mut VaultSecret, target: &mut TargetSecret) -> Result<()> {
        let secret_type = SecretType::from_template(&request.spec.template.secret_type);
        if let Some(existing) = &target.secret_type {
            if existing != &secret_type {
                return Err(SyncError::ImmutableType {
                    existing: existing.to_string(),
                    requested: secret_type.to_string(),
                });
            }
        }

        let mut staged = target.clone();
        apply_labels(request, &mut staged);
        staged.metadata.annotations.extend(
            request.spec.template.metadata.annotations.iter().map(|(k, v)| (k.clone(), v.clone())),
        );
        staged.secret_type = Some(secret_type.clone());

        let qualified_name = request.qualified_name();
        let ctx = BuildContext {
            request: &qualified_name,
            index: &self.index,
            client: &self.client,
            hasher: self.hasher,
        };

        let mut status = request.status.clone();
        strategy_for(&secret_type).apply(&ctx, &request.spec.data, &mut status, &mut staged).await?;

        debug!(
            secret_type = %secret_type,
            keys = staged.data.len(),
            records = status.vault_record_statuses.len(),
            "Secret built"
        );
        request.status = status;
        *target = staged;
        Ok(())
    }
}

/// Standard request labels first, then template labels on top
fn apply_labels(request: &VaultSecret, target: &mut TargetSecret) {
    let standard = request
        .metadata
        .labels
        .iter()
        .filter(|(label, _)| STANDARD_LABELS.contains(&label.as_str()));
    let template = request.spec.template.metadata.labels.iter();

    for (label, value) in standard.chain(template) {
        target.metadata.labels.insert(label.clone(), value.clone());
    }
}
