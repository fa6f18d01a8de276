//! Policy cache: the whole policy set under a single key.

use super::loader::PolicySource;
use crate::cache::TtlCache;
use crate::domain::Policy;
use crate::errors::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct PolicyCache {
    cache: TtlCache<(), Arc<Vec<Policy>>>,
    source: Arc<dyn PolicySource>,
}

impl fmt::Debug for PolicyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyCache")
            .field("loaded", &!self.cache.is_empty())
            .field("ttl", &self.cache.ttl())
            .finish()
    }
}

impl PolicyCache {
    pub fn new(source: Arc<dyn PolicySource>, ttl: Duration) -> Self {
        Self { cache: TtlCache::new("policies", ttl), source }
    }

    /// Current policy set, loading it on a miss
    pub async fn get(&self) -> Result<Arc<Vec<Policy>>> {
        self.cache
            .get_or_try_load((), || async { self.source.load().await.map(Arc::new) })
            .await
    }

    pub fn flush(&self) {
        self.cache.flush();
    }
}
