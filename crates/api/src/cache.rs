//! Cache-aside layer for read-heavy listing queries.
//!
//! Wraps `moka` with the contract the route handlers need: look a key up, on
//! miss compute from the database and populate, and invalidate by key prefix
//! after writes. Payloads are stored as serialized JSON strings so that
//! repeated hits return byte-identical bodies, and each entry carries its own
//! TTL (listings and admin views expire on different schedules).
//!
//! Cache failures are never fatal: a corrupt entry falls through to the
//! database, and a failed invalidation is logged and forgotten. The cache and
//! the database are independent systems; a crash between a committed write
//! and its invalidation leaves a stale entry until the TTL expires, which
//! callers must tolerate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// A serialized response body plus its time-to-live.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    body: Arc<str>,
    ttl: Duration,
}

/// Expiry policy reading each entry's own TTL.
struct PerEntryTtl;

impl Expiry<String, CachedPayload> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Where a response came from.
///
/// Handlers tag their response message with this so clients (and tests) can
/// tell a cache hit from a fresh read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Cache,
    Origin,
}

impl CacheSource {
    /// Human-readable message suffix used in response envelopes.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Cache => "data from cache",
            Self::Origin => "data from origin",
        }
    }
}

/// Shared response cache, cheaply cloneable.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, CachedPayload>,
}

impl ResponseCache {
    /// Create a cache bounded to `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { inner }
    }

    /// Look up `key`; on miss, await `compute`, store its serialized result
    /// under `key` with `ttl`, and return it.
    ///
    /// A cached entry that fails to deserialize is dropped and recomputed.
    /// Serialization failures on the write side skip the cache but still
    /// return the computed value.
    ///
    /// # Errors
    ///
    /// Only `compute`'s error is propagated; cache trouble never fails the
    /// call.
    pub async fn get_or_compute<T, F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<(T, CacheSource), E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(entry) = self.inner.get(key).await {
            match serde_json::from_str(&entry.body) {
                Ok(value) => {
                    debug!(key, "cache hit");
                    return Ok((value, CacheSource::Cache));
                }
                Err(err) => {
                    warn!(key, error = %err, "dropping undeserializable cache entry");
                    self.inner.invalidate(key).await;
                }
            }
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(body) => {
                self.inner
                    .insert(
                        key.to_owned(),
                        CachedPayload {
                            body: body.into(),
                            ttl,
                        },
                    )
                    .await;
            }
            Err(err) => warn!(key, error = %err, "failed to serialize value for cache"),
        }

        Ok((value, CacheSource::Origin))
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Best-effort and eventually consistent: a concurrent read may still
    /// observe a stale value until the scan completes, bounded by the entry
    /// TTL. Must be called after any write covered by the prefix (product
    /// CRUD, user updates, favorite toggles).
    pub fn invalidate_prefix(&self, prefix: &str) {
        let prefix = prefix.to_owned();
        if let Err(err) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!(error = %err, "cache prefix invalidation failed");
        }
    }

    /// Flush internal maintenance work. Test helper.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

/// Deterministic key construction per cacheable view.
///
/// Each function maps the semantically relevant query parameters (and nothing
/// else) to one key, so two equivalent requests share an entry. Listings with
/// low-reuse filters (free-text search, price bounds, category sets) are not
/// cacheable and have no key.
pub mod keys {
    /// Prefix covering all product listing pages.
    pub const PRODUCTS: &str = "products:";

    /// Prefix covering the admin user listing.
    pub const ADMIN_USERS: &str = "admin:users:";

    #[must_use]
    pub fn product_listing(page: u32, limit: u32) -> String {
        format!("{PRODUCTS}page:{page}:limit:{limit}")
    }

    #[must_use]
    pub fn admin_users(page: u32, limit: u32) -> String {
        format!("{ADMIN_USERS}page:{page}:limit:{limit}")
    }

    /// Prefix covering one user's favorite listings.
    #[must_use]
    pub fn favorites_prefix(user_id: i64) -> String {
        format!("favorites:user:{user_id}:")
    }

    #[must_use]
    pub fn favorites(user_id: i64, page: u32, limit: u32) -> String {
        format!("{}page:{page}:limit:{limit}", favorites_prefix(user_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("compute failed")]
    struct ComputeError;

    async fn counted(
        cache: &ResponseCache,
        key: &str,
        ttl: Duration,
        calls: &AtomicUsize,
        value: &str,
    ) -> (String, CacheSource) {
        cache
            .get_or_compute(key, ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ComputeError>(value.to_owned())
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_get_hits_without_recompute() {
        let cache = ResponseCache::new(100);
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let (first, src1) = counted(&cache, "products:page:1:limit:10", ttl, &calls, "a").await;
        let (second, src2) = counted(&cache, "products:page:1:limit:10", ttl, &calls, "b").await;

        assert_eq!(src1, CacheSource::Origin);
        assert_eq!(src2, CacheSource::Cache);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // The hit replays the stored payload, not the new compute value.
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_distinct_keys_compute_independently() {
        let cache = ResponseCache::new(100);
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        counted(&cache, "products:page:1:limit:10", ttl, &calls, "a").await;
        counted(&cache, "products:page:2:limit:10", ttl, &calls, "b").await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_forces_recompute() {
        let cache = ResponseCache::new(100);
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        counted(&cache, "products:page:1:limit:10", ttl, &calls, "a").await;
        counted(&cache, "admin:users:page:1:limit:10", ttl, &calls, "u").await;

        cache.invalidate_prefix(keys::PRODUCTS);
        cache.run_pending_tasks().await;

        let (_, src) = counted(&cache, "products:page:1:limit:10", ttl, &calls, "a2").await;
        assert_eq!(src, CacheSource::Origin);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // The other prefix is untouched.
        let (_, src) = counted(&cache, "admin:users:page:1:limit:10", ttl, &calls, "u").await;
        assert_eq!(src, CacheSource::Cache);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = ResponseCache::new(100);
        let calls = AtomicUsize::new(0);

        counted(&cache, "k", Duration::from_millis(50), &calls, "a").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        cache.run_pending_tasks().await;

        let (_, src) = counted(&cache, "k", Duration::from_millis(50), &calls, "a").await;
        assert_eq!(src, CacheSource::Origin);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_and_caches_nothing() {
        let cache = ResponseCache::new(100);

        let result: Result<(String, CacheSource), ComputeError> = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Err(ComputeError) })
            .await;
        assert!(result.is_err());

        let calls = AtomicUsize::new(0);
        let (_, src) = counted(&cache, "k", Duration::from_secs(60), &calls, "a").await;
        assert_eq!(src, CacheSource::Origin);
    }

    #[test]
    fn test_keys_are_deterministic() {
        assert_eq!(keys::product_listing(1, 10), keys::product_listing(1, 10));
        assert_eq!(keys::product_listing(2, 10), "products:page:2:limit:10");
        assert_eq!(keys::admin_users(1, 5), "admin:users:page:1:limit:5");
        assert_eq!(keys::favorites(9, 1, 10), "favorites:user:9:page:1:limit:10");
        assert!(keys::favorites(9, 1, 10).starts_with(&keys::favorites_prefix(9)));
    }
}
