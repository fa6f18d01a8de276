//! Policy loader
//!
//! Scans every group visible to the operator-wide client for records whose
//! comment declares policies. The operator client is created lazily on the
//! first load and reused afterwards.

use super::declaration::{policies_from_record, Skipped};
use crate::config::ConnectionSettings;
use crate::domain::{ClientCredentials, Group, Policy, RecordOptions};
use crate::errors::Result;
use crate::observability::ApiMetrics;
use crate::vault::{VaultClient, VaultConnector};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Produces the full policy set.
#[async_trait]
pub trait PolicySource: Send + Sync {
    async fn load(&self) -> Result<Vec<Policy>>;
}

/// Loads policies from the vault with the operator's own credentials.
pub struct PolicyLoader {
    settings: ConnectionSettings,
    connector: Arc<dyn VaultConnector>,
    metrics: ApiMetrics,
    client: OnceCell<VaultClient>,
}

impl fmt::Debug for PolicyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyLoader")
            .field("uri", &self.settings.uri)
            .field("client_id", &self.settings.client_id)
            .field("connected", &self.client.initialized())
            .finish()
    }
}

impl PolicyLoader {
    pub fn new(
        settings: ConnectionSettings,
        connector: Arc<dyn VaultConnector>,
        metrics: ApiMetrics,
    ) -> Self {
        Self { settings, connector, metrics, client: OnceCell::new() }
    }

    async fn client(&self) -> Result<&VaultClient> {
        self.client
            .get_or_try_init(|| async {
                let credentials = ClientCredentials::new(
                    self.settings.client_id.clone(),
                    self.settings.client_secret.clone(),
                );
                VaultClient::connect(
                    self.connector.as_ref(),
                    &self.settings.uri,
                    &credentials,
                    self.metrics.clone(),
                )
                .await
            })
            .await
    }

    async fn load_group(
        &self,
        client: &VaultClient,
        group: &Group,
        policies: &mut Vec<Policy>,
    ) -> Result<()> {
        debug!(group = %group.uuid, name = %group.name, "Loading group policies");
        let records = client.list_records(group).await?;

        let mut found = 0;
        for summary in records {
            if summary.is_restricted() {
                continue;
            }

            let options = RecordOptions { secret: true, audit: false };
            let record = client.get_record(group, &summary.uuid, options).await?;
            match policies_from_record(&record) {
                Ok(declared) => {
                    found += declared.len();
                    policies.extend(declared);
                }
                Err(Skipped::NotAPolicyRecord) => {
                    debug!(record = %record.uuid, "Record carries no policies");
                }
                Err(Skipped::Malformed(reason)) => {
                    warn!(
                        record = %record.uuid,
                        error = %reason,
                        "Skipping malformed policy declaration"
                    );
                }
            }
        }

        debug!(group = %group.uuid, count = found, "Group policies loaded");
        Ok(())
    }
}

#[async_trait]
impl PolicySource for PolicyLoader {
    async fn load(&self) -> Result<Vec<Policy>> {
        let client = self.client().await?;
        let groups = client.list_groups().await?;

        let mut policies = Vec::new();
        for group in &groups {
            self.load_group(client, group, &mut policies).await?;
        }

        info!(groups = groups.len(), policies = policies.len(), "Policies loaded");
        Ok(policies)
    }
}
