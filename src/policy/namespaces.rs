//! Namespace listing for label-selector policies.

use super::selector::LabelSelector;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Source of platform namespaces and their labels.
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    /// Names of all namespaces whose labels match `selector`
    async fn list_namespaces(&self, selector: &LabelSelector) -> Result<Vec<String>>;
}

/// In-process namespace registry; clones share state.
#[derive(Debug, Clone, Default)]
pub struct NamespaceCatalog {
    namespaces: Arc<RwLock<BTreeMap<String, BTreeMap<String, String>>>>,
}

impl NamespaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a namespace or replace its labels
    pub async fn upsert<I, K, V>(&self, name: &str, labels: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels = labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.namespaces.write().await.insert(name.to_string(), labels);
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.namespaces.write().await.remove(name).is_some()
    }

    pub async fn labels(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.namespaces.read().await.get(name).cloned()
    }
}

#[async_trait]
impl NamespaceLister for NamespaceCatalog {
    async fn list_namespaces(&self, selector: &LabelSelector) -> Result<Vec<String>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .iter()
            .filter(|(_, labels)| selector.matches(labels))
            .map(|(name, _)| name.clone())
            .collect())
    }
}
