//! Policy engine: maps a request to the vault client allowed to serve it.

use super::cache::PolicyCache;
use super::resolver::NamespacePolicyResolver;
use crate::domain::VaultSecret;
use crate::errors::Result;
use crate::vault::{ClientCache, VaultClient};
use std::sync::Arc;
use tracing::{debug, Span};

#[derive(Debug, Clone)]
pub struct PolicyEngine {
    policies: PolicyCache,
    resolver: NamespacePolicyResolver,
    clients: ClientCache,
}

impl PolicyEngine {
    pub fn new(
        policies: PolicyCache,
        resolver: NamespacePolicyResolver,
        clients: ClientCache,
    ) -> Self {
        Self { policies, resolver, clients }
    }

    /// Client for the credentials whose policy covers the request's namespace.
    ///
    /// A resolution failure drops the cached policy set so the next call
    /// reloads it; the error itself is returned unchanged.
    pub async fn get_client(&self, request: &VaultSecret) -> Result<Arc<VaultClient>> {
        let policies = self.policies.get().await?;

        let policy = match self.resolver.resolve(&policies, request.namespace()).await {
            Ok(policy) => policy,
            Err(e) => {
                if e.is_policy_error() {
                    debug!(namespace = %request.namespace(), "Dropping cached policies");
                    self.policies.flush();
                }
                return Err(e);
            }
        };

        Span::current().record("client_id", policy.client_id().as_str());
        self.clients.get(&policy.credentials).await
    }

    /// Empty the policy and client caches
    pub fn flush(&self) {
        self.policies.flush();
        self.clients.flush();
    }

    pub fn clients(&self) -> &ClientCache {
        &self.clients
    }
}
