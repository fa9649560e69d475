//! Time-bounded memoization of aggregate reads by id.
//!
//! Concurrent misses for the same id are single-flight: the first caller runs
//! the load and the others await the same result. Absent results are cached
//! like present ones. A failed load is not cached and the next caller retries.
//! Entries expire `ttl` after they were loaded and are reloaded synchronously
//! on the next access. There is no size bound.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::Result;
use crate::models::DatasetConfigAggregate;

pub const DEFAULT_AGGREGATE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CachedAggregate {
    loaded_at: Instant,
    value: Option<DatasetConfigAggregate>,
}

#[derive(Debug, Default)]
struct CacheSlot {
    cell: OnceCell<CachedAggregate>,
}

impl CacheSlot {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cell
            .get()
            .is_some_and(|cached| cached.loaded_at.elapsed() >= ttl)
    }
}

#[derive(Debug)]
pub struct AggregateCache {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, Arc<CacheSlot>>>,
}

impl Default for AggregateCache {
    fn default() -> Self {
        Self::new(DEFAULT_AGGREGATE_TTL)
    }
}

impl AggregateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached aggregate for `id`, running `load` on a miss or
    /// after expiry.
    pub async fn get_or_load<F, Fut>(
        &self,
        id: Uuid,
        load: F,
    ) -> Result<Option<DatasetConfigAggregate>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<DatasetConfigAggregate>>>,
    {
        let slot = self.slot_for(id).await;
        let cached = slot
            .cell
            .get_or_try_init(|| async move {
                let value = load().await?;
                Ok::<_, crate::StoreError>(CachedAggregate {
                    loaded_at: Instant::now(),
                    value,
                })
            })
            .await?;
        Ok(cached.value.clone())
    }

    /// Drops the entry for `id` so the next read goes to the store.
    pub async fn invalidate(&self, id: Uuid) {
        self.entries.lock().await.remove(&id);
    }

    async fn slot_for(&self, id: Uuid) -> Arc<CacheSlot> {
        let mut entries = self.entries.lock().await;
        match entries.get(&id) {
            Some(slot) if !slot.is_expired(self.ttl) => Arc::clone(slot),
            _ => {
                let slot = Arc::new(CacheSlot::default());
                entries.insert(id, Arc::clone(&slot));
                slot
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::StoreError;

    fn aggregate(id: Uuid, is_mutable: bool) -> DatasetConfigAggregate {
        DatasetConfigAggregate {
            id,
            is_mutable,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_read_within_ttl_is_served_from_cache() {
        let cache = AggregateCache::new(Duration::from_secs(300));
        let loads = AtomicUsize::new(0);
        let id = Uuid::new_v4();

        for _ in 0..2 {
            let value = cache
                .get_or_load(id, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, StoreError>(Some(aggregate(id, true)))
                })
                .await
                .unwrap();
            assert_eq!(value, Some(aggregate(id, true)));
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_expiry_reflects_new_state() {
        let cache = AggregateCache::new(Duration::from_secs(300));
        let id = Uuid::new_v4();

        let first = cache
            .get_or_load(id, || async { Ok::<_, StoreError>(Some(aggregate(id, true))) })
            .await
            .unwrap();
        assert!(first.unwrap().is_mutable);

        tokio::time::advance(Duration::from_secs(299)).await;
        let cached = cache
            .get_or_load(id, || async { Ok::<_, StoreError>(Some(aggregate(id, false))) })
            .await
            .unwrap();
        assert!(cached.unwrap().is_mutable);

        tokio::time::advance(Duration::from_secs(2)).await;
        let refreshed = cache
            .get_or_load(id, || async { Ok::<_, StoreError>(Some(aggregate(id, false))) })
            .await
            .unwrap();
        assert!(!refreshed.unwrap().is_mutable);
    }

    #[tokio::test]
    async fn absent_results_are_cached() {
        let cache = AggregateCache::default();
        let loads = AtomicUsize::new(0);
        let id = Uuid::new_v4();

        for _ in 0..3 {
            let value = cache
                .get_or_load(id, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, StoreError>(None)
                })
                .await
                .unwrap();
            assert!(value.is_none());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_are_retried() {
        let cache = AggregateCache::default();
        let id = Uuid::new_v4();

        let err = cache
            .get_or_load(id, || async {
                Err::<Option<DatasetConfigAggregate>, _>(StoreError::SessionClosed)
            })
            .await;
        assert!(matches!(err, Err(StoreError::SessionClosed)));

        let value = cache
            .get_or_load(id, || async { Ok::<_, StoreError>(Some(aggregate(id, true))) })
            .await
            .unwrap();
        assert!(value.is_some());
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = AggregateCache::default();
        let id = Uuid::new_v4();

        cache
            .get_or_load(id, || async { Ok::<_, StoreError>(None) })
            .await
            .unwrap();
        cache.invalidate(id).await;

        let value = cache
            .get_or_load(id, || async { Ok::<_, StoreError>(Some(aggregate(id, true))) })
            .await
            .unwrap();
        assert!(value.is_some());
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_load() {
        let cache = Arc::new(AggregateCache::default());
        let loads = Arc::new(AtomicUsize::new(0));
        let id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let loads = Arc::clone(&loads);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load(id, || async move {
                        loads.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, StoreError>(Some(aggregate(id, true)))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
