//! Process-wide, in-memory caches.
//!
//! A [`SnapshotCache`] holds one immutable value behind an `Arc`. Readers clone
//! the `Arc` under a short read lock; a refresh builds the replacement off to
//! the side and swaps it in under the write lock, so no reader ever sees a
//! partially populated value.

use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

#[derive(Debug)]
struct Stamped<T> {
    value: Arc<T>,
    fetched_at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

#[derive(Debug)]
pub struct SnapshotCache<T> {
    name: &'static str,
    ttl: Duration,
    serve_stale: bool,
    slot: RwLock<Option<Stamped<T>>>,
}

impl<T> SnapshotCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        SnapshotCache {
            name,
            ttl,
            serve_stale: false,
            slot: RwLock::new(None),
        }
    }

    /// On refresh failure, fall back to the previous snapshot if it is still usable.
    pub fn serving_stale(mut self) -> Self {
        self.serve_stale = true;
        self
    }

    /// Current snapshot regardless of age.
    pub fn peek(&self) -> Option<Arc<T>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|s| Arc::clone(&s.value))
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|s| s.fetched_at)
    }

    pub fn get_or_refresh<U, R>(&self, is_usable: U, refresh: R) -> Result<Arc<T>, AppError>
    where
        U: Fn(&T) -> bool,
        R: FnOnce() -> Result<T, AppError>,
    {
        self.get_or_refresh_at(Utc::now(), is_usable, refresh)
    }

    /// Return the cached value if it was fetched less than one TTL before `now`
    /// and `is_usable` accepts it; otherwise run `refresh` and publish its result.
    pub fn get_or_refresh_at<U, R>(
        &self,
        now: DateTime<Utc>,
        is_usable: U,
        refresh: R,
    ) -> Result<Arc<T>, AppError>
    where
        U: Fn(&T) -> bool,
        R: FnOnce() -> Result<T, AppError>,
    {
        let previous = {
            let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(current) if current.is_fresh(now, self.ttl) && is_usable(current.value.as_ref()) => {
                    return Ok(Arc::clone(&current.value));
                }
                Some(current) => Some(Arc::clone(&current.value)),
                None => None,
            }
        };

        match refresh() {
            Ok(fresh) => {
                let value = Arc::new(fresh);
                let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
                *slot = Some(Stamped {
                    value: Arc::clone(&value),
                    fetched_at: now,
                });
                info!(cache = self.name, "snapshot refreshed");
                Ok(value)
            }
            Err(err) => match previous {
                Some(stale) if self.serve_stale && is_usable(stale.as_ref()) => {
                    warn!(cache = self.name, error = %err, "refresh failed, serving stale snapshot");
                    Ok(stale)
                }
                _ => Err(err),
            },
        }
    }
}

/// Unbounded memo of fully built values keyed by identity.
#[derive(Debug)]
pub struct MemoMap<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> Default for MemoMap<K, V> {
    fn default() -> Self {
        MemoMap {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> MemoMap<K, V> {
    pub fn new() -> Self {
        MemoMap::default()
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn serves_cached_value_within_ttl() {
        let cache = SnapshotCache::new("test", Duration::minutes(5));
        let calls = Cell::new(0);
        let refresh = || {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2, 3])
        };

        cache.get_or_refresh_at(t0(), |_| true, refresh).unwrap();
        let again = cache
            .get_or_refresh_at(t0() + Duration::minutes(4), |_| true, || Ok(vec![9]))
            .unwrap();

        assert_eq!(*again, vec![1, 2, 3]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn refreshes_after_ttl() {
        let cache = SnapshotCache::new("test", Duration::minutes(5));
        cache.get_or_refresh_at(t0(), |_| true, || Ok(1)).unwrap();
        let value = cache
            .get_or_refresh_at(t0() + Duration::minutes(5), |_| true, || Ok(2))
            .unwrap();
        assert_eq!(*value, 2);
        assert_eq!(cache.fetched_at(), Some(t0() + Duration::minutes(5)));
    }

    #[test]
    fn unusable_snapshot_is_refetched_even_when_young() {
        let cache = SnapshotCache::new("test", Duration::hours(6));
        cache.get_or_refresh_at(t0(), |v: &Vec<u32>| !v.is_empty(), || Ok(vec![])).unwrap();
        let value = cache
            .get_or_refresh_at(t0(), |v: &Vec<u32>| !v.is_empty(), || Ok(vec![7]))
            .unwrap();
        assert_eq!(*value, vec![7]);
    }

    #[test]
    fn stale_snapshot_covers_refresh_failure() {
        let cache = SnapshotCache::new("test", Duration::hours(6)).serving_stale();
        cache.get_or_refresh_at(t0(), |_| true, || Ok("v1")).unwrap();

        let value = cache
            .get_or_refresh_at(t0() + Duration::hours(7), |_| true, || {
                Err(AppError::CatalogUnavailable("down".into()))
            })
            .unwrap();
        assert_eq!(*value, "v1");
    }

    #[test]
    fn failure_without_snapshot_propagates() {
        let cache: SnapshotCache<u8> = SnapshotCache::new("test", Duration::hours(6)).serving_stale();
        let result = cache.get_or_refresh_at(t0(), |_| true, || Err(AppError::EmptyCohort));
        assert!(matches!(result, Err(AppError::EmptyCohort)));
        assert!(cache.peek().is_none());
    }

    #[test]
    fn strict_cache_does_not_serve_stale() {
        let cache = SnapshotCache::new("test", Duration::minutes(5));
        cache.get_or_refresh_at(t0(), |_| true, || Ok(1)).unwrap();
        let result = cache.get_or_refresh_at(t0() + Duration::hours(1), |_| true, || {
            Err(AppError::EmptyCohort)
        });
        assert!(result.is_err());
    }

    #[test]
    fn memo_map_returns_shared_values() {
        let memo = MemoMap::new();
        memo.insert("p1".to_string(), 10);
        assert_eq!(memo.get(&"p1".to_string()).as_deref(), Some(&10));
        assert!(memo.get(&"p2".to_string()).is_none());
        assert_eq!(memo.len(), 1);
    }
}
