//! Common test utilities for all integration tests.
//!
//! Provides an in-memory vault seeded with one operator client, one team
//! client and a policy mapping the `team-a` namespace to the team client.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use vaultsync::domain::{Group, GroupId, Record, RecordId, SecretString};
use vaultsync::observability::{ApiMetrics, VaultCall};
use vaultsync::policy::{NamespacePolicyResolver, PolicyCache, PolicyLoader};
use vaultsync::secret::{ContentHasher, SecretBuilder};
use vaultsync::vault::{ClientCache, VaultConnector, VaultIndexCache};
use vaultsync::{
    ConnectionSettings, NamespaceCatalog, PolicyEngine, SecretSynchronizer, SyncOutcome,
    TargetSecret, VaultSecret,
};

pub const VAULT_URI: &str = "mem://vault";
pub const OPERATOR_ID: &str = "operator";
pub const OPERATOR_SECRET: &str = "operator-secret";
pub const POLICY_GROUP: &str = "policies";
pub const TEAM_GROUP: &str = "team-a-vault";
pub const TEAM_CLIENT: &str = "team-a-client";
pub const TEAM_SECRET: &str = "team-a-secret";
pub const NAMESPACE: &str = "team-a";

/// Fixed modification time so status timestamps are predictable
pub fn modified_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Empty record; the helpers below fill in what a test needs
pub fn record(id: &str) -> Record {
    Record {
        uuid: RecordId::new(id),
        name: format!("record {}", id),
        color: None,
        username: None,
        password: None,
        url: None,
        file: None,
        comment: None,
        last_modified_at: modified_at(),
    }
}

pub fn login(id: &str, username: &str, password: &str) -> Record {
    Record {
        username: Some(username.to_string()),
        password: Some(SecretString::new(password)),
        ..record(id)
    }
}

pub fn file(id: &str, content: impl Into<Vec<u8>>) -> Record {
    Record { file: Some(content.into()), ..record(id) }
}

/// Policy carrier record granting `client_id` for the given declarations
pub fn policy(id: &str, client_id: &str, client_secret: &str, declarations: &str) -> Record {
    Record {
        comment: Some(format!("policies:\n{}", declarations)),
        ..login(id, client_id, client_secret)
    }
}

/// In-memory vault plus the caches of one synchronizer.
pub struct Harness {
    pub vault: vaultsync::InMemoryVault,
    pub namespaces: NamespaceCatalog,
    pub metrics: ApiMetrics,
    pub index: VaultIndexCache,
    pub synchronizer: SecretSynchronizer,
}

impl Harness {
    /// Vault with the operator, the team client and an exact-name policy
    pub async fn new() -> Self {
        let harness = Self::empty().await;
        harness
            .put_policy(policy(
                "policy-team-a",
                TEAM_CLIENT,
                TEAM_SECRET,
                "  - type: namespace\n    name: team-a\n",
            ))
            .await;
        harness
    }

    /// Vault with clients and groups but no policies
    pub async fn empty() -> Self {
        let vault = vaultsync::InMemoryVault::default();
        vault.register_client(OPERATOR_ID, OPERATOR_SECRET).await;
        vault.register_client(TEAM_CLIENT, TEAM_SECRET).await;
        vault.add_group(Group::new(POLICY_GROUP, "Policies")).await;
        vault.add_group(Group::new(TEAM_GROUP, "Team A")).await;
        vault.grant(OPERATOR_ID, &GroupId::new(POLICY_GROUP)).await;
        vault.grant(TEAM_CLIENT, &GroupId::new(TEAM_GROUP)).await;

        let namespaces = NamespaceCatalog::new();
        namespaces.upsert(NAMESPACE, [("team", "a"), ("env", "prod")]).await;

        let metrics = ApiMetrics::new();
        let connector: Arc<dyn VaultConnector> = Arc::new(vault.clone());
        let settings = ConnectionSettings::new(VAULT_URI, OPERATOR_ID, OPERATOR_SECRET);
        let loader = PolicyLoader::new(settings, Arc::clone(&connector), metrics.clone());

        let engine = PolicyEngine::new(
            PolicyCache::new(Arc::new(loader), Duration::from_secs(3600)),
            NamespacePolicyResolver::new(Arc::new(namespaces.clone())),
            ClientCache::new(connector, VAULT_URI, metrics.clone(), Duration::from_secs(600)),
        );
        let index = VaultIndexCache::new(Duration::from_secs(600));
        let synchronizer = SecretSynchronizer::new(engine, index.clone()).with_hasher(hasher());

        Self { vault, namespaces, metrics, index, synchronizer }
    }

    pub async fn put(&self, record: Record) {
        self.vault.put_record(&GroupId::new(TEAM_GROUP), record).await;
    }

    pub async fn put_policy(&self, record: Record) {
        self.vault.put_record(&GroupId::new(POLICY_GROUP), record).await;
    }

    /// Apply `update` to a record, move its modification time forward and
    /// drop the cached index so the next pass sees it.
    pub async fn update<F>(&self, id: &str, update: F)
    where
        F: FnOnce(&mut Record),
    {
        assert!(self.vault.update_record(&RecordId::new(id), update).await);
        self.index.flush();
    }

    pub async fn reconcile(
        &self,
        request: &mut VaultSecret,
        target: &mut TargetSecret,
    ) -> SyncOutcome {
        self.synchronizer.reconcile(request, target).await
    }

    /// Builder for the team client, bypassing the synchronizer
    pub async fn builder(&self, request: &VaultSecret) -> SecretBuilder {
        let client = self.synchronizer.engine().get_client(request).await.unwrap();
        let index = self.index.get(&client).await.unwrap();
        SecretBuilder::new(index, client).with_hasher(hasher())
    }

    pub fn record_fetches(&self) -> u64 {
        self.metrics.count(VaultCall::GetRecord)
    }
}

/// Lowest cost bcrypt accepts, keeps the suites fast
pub const TEST_COST: u32 = 4;

pub fn hasher() -> ContentHasher {
    ContentHasher::new(TEST_COST)
}

pub fn request(name: &str) -> VaultSecret {
    VaultSecret::new(NAMESPACE, name)
}

pub fn target(name: &str) -> TargetSecret {
    TargetSecret::new(NAMESPACE, name)
}
