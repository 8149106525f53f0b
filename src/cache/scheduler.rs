//! Delayed invalidation scheduler
//!
//! Each delayed deletion is a detached task: requests never await it.
//! Tasks are tracked only so shutdown can fire them early and join them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::store::CacheStore;

pub struct InvalidationScheduler {
    store: Arc<dyn CacheStore>,
    tasks: Mutex<JoinSet<()>>,
    shutdown: watch::Sender<bool>,
}

impl InvalidationScheduler {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            tasks: Mutex::new(JoinSet::new()),
            shutdown,
        }
    }

    /// Delete `key` after `delay`, or immediately once draining starts.
    ///
    /// Must be called within a tokio runtime.
    pub fn schedule(&self, key: CacheKey, delay: Duration) {
        let store = Arc::clone(&self.store);
        let mut stop = self.shutdown.subscribe();

        let task = async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.wait_for(|stop| *stop) => {}
            }
            match store.delete(key.as_str()).await {
                Ok(()) => debug!(key = %key, "Delayed cache delete"),
                Err(e) => warn!(key = %key, error = %e, "Delayed cache delete failed"),
            }
        };

        match self.tasks.lock() {
            Ok(mut tasks) => {
                while tasks.try_join_next().is_some() {}
                tasks.spawn(task);
            }
            Err(_) => {
                warn!("Invalidation task set poisoned, running delete untracked");
                tokio::spawn(task);
            }
        }
    }

    /// Number of tracked deletions not yet reaped
    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Fire every pending deletion now and wait for all of them
    pub async fn drain(&self) {
        self.shutdown.send_replace(true);
        let mut tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return,
        };

        let count = tasks.len();
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Invalidation task failed");
            }
        }
        debug!(count, "Invalidation scheduler drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn key(name: &str) -> CacheKey {
        CacheKey::derive("users", name, "", "")
    }

    #[tokio::test]
    async fn test_delete_fires_after_delay() {
        let cache = Arc::new(MemoryCache::new());
        let scheduler = InvalidationScheduler::new(cache.clone());
        let k = key("/users/1");
        cache.set(k.as_str(), "v".to_string(), Duration::from_secs(60)).await.unwrap();

        scheduler.schedule(k.clone(), Duration::from_millis(20));
        assert!(cache.contains(k.as_str()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!cache.contains(k.as_str()));
    }

    #[tokio::test]
    async fn test_drain_fires_pending_immediately() {
        let cache = Arc::new(MemoryCache::new());
        let scheduler = InvalidationScheduler::new(cache.clone());
        for i in 0..3 {
            let k = key(&format!("/users/{i}"));
            cache.set(k.as_str(), "v".to_string(), Duration::from_secs(60)).await.unwrap();
            scheduler.schedule(k, Duration::from_secs(3600));
        }
        assert_eq!(scheduler.pending(), 3);

        tokio::time::timeout(Duration::from_secs(5), scheduler.drain())
            .await
            .unwrap();
        assert_eq!(scheduler.pending(), 0);
        assert!(cache.is_empty());
    }
}
