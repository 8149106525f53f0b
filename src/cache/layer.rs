//! # Cache Consistency Layer
//!
//! Read-through lookup and population for list/single results, plus the
//! update/delete invalidation sequence:
//!
//! 1. delete the single-record entry before mutating
//! 2. mutate
//! 3. schedule a second delete after the configured delay
//!
//! Every cache failure is logged and swallowed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::errors::CacheResult;
use super::key::CacheKey;
use super::scheduler::InvalidationScheduler;
use super::store::CacheStore;

#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn CacheStore>,
    scheduler: Arc<InvalidationScheduler>,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        let scheduler = Arc::new(InvalidationScheduler::new(Arc::clone(&store)));
        Self { store, scheduler }
    }

    /// Cached payload for `key`; backend errors count as a miss
    pub async fn lookup(&self, key: &CacheKey) -> Option<String> {
        match self.store.get(key.as_str()).await {
            Ok(Some(payload)) => {
                debug!(key = %key, "Cache hit");
                Some(payload)
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, falling through");
                None
            }
        }
    }

    /// Serialize and store a read result
    pub async fn populate<T: Serialize + ?Sized>(&self, key: &CacheKey, payload: &T, ttl: Duration) {
        if let Err(e) = self.try_populate(key, payload, ttl).await {
            warn!(key = %key, error = %e, "Cache populate failed");
        }
    }

    async fn try_populate<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        payload: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        let encoded = serde_json::to_string(payload)?;
        self.store.set(key.as_str(), encoded, ttl).await
    }

    /// Delete an entry now
    pub async fn invalidate(&self, key: &CacheKey) {
        if let Err(e) = self.store.delete(key.as_str()).await {
            warn!(key = %key, error = %e, "Cache invalidate failed");
        }
    }

    /// Delete an entry again after `delay`, without waiting
    pub fn invalidate_later(&self, key: CacheKey, delay: Duration) {
        self.scheduler.schedule(key, delay);
    }

    /// Delayed deletions still tracked
    pub fn pending_invalidations(&self) -> usize {
        self.scheduler.pending()
    }

    /// Fire and join every pending delayed deletion
    pub async fn drain(&self) {
        self.scheduler.drain().await;
    }
}
