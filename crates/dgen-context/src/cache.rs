//! TTL result cache
//!
//! [`ResultCache`] is an injected handle over a pluggable [`CacheBackend`].
//! Values are stored as JSON strings so a remote backend can hold them.
//! Every failure mode (timeout, backend error, undecodable entry) is a
//! miss: callers recompute and carry on.

use crate::error::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dgen_model::{Fingerprint, ResolutionTier, StrategyKind, TemplateKey};
use moka::future::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bound on a single cache operation
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(250);
/// Default capacity of the in-memory backend
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Key/value store with per-entry TTL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug + 'static {
    /// Fetch a live entry
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store an entry for `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop an entry
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Stored value and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: String,
    pub ttl: Duration,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create entry expiring `ttl` from now
    #[must_use]
    pub fn new(value: String, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            value,
            ttl,
            expires_at,
        }
    }

    /// Whether the entry is past its expiry
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

struct EntryTtl;

impl Expiry<String, Arc<CacheEntry>> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process backend on `moka`
#[derive(Clone)]
pub struct MemoryCacheBackend {
    inner: Cache<String, Arc<CacheEntry>>,
}

impl MemoryCacheBackend {
    /// Create backend holding at most `max_entries`
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl Debug for MemoryCacheBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheBackend")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // moka expires lazily; double-check against the wall clock
        Ok(self
            .inner
            .get(key)
            .await
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            self.inner.invalidate(key).await;
            return Ok(());
        }
        self.inner
            .insert(key.to_string(), Arc::new(CacheEntry::new(value, ttl)))
            .await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

/// Cache key namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of an aggregated context
    #[must_use]
    pub fn context(fingerprint: &Fingerprint) -> Self {
        Self(format!("ctx:{fingerprint}"))
    }

    /// Key of a rendered document
    #[must_use]
    pub fn document(
        fingerprint: &Fingerprint,
        key: &TemplateKey,
        tier: ResolutionTier,
        strategy: StrategyKind,
    ) -> Self {
        Self(format!(
            "doc:{fingerprint}:{}/{}/{}:{}:{}",
            key.platform(),
            key.document_type(),
            key.tech_stack(),
            tier.as_str(),
            strategy.as_str()
        ))
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed, timeout-bounded, failure-tolerant cache handle
#[derive(Debug, Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    io_timeout: Duration,
}

impl ResultCache {
    /// Wrap a backend
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// In-memory cache holding at most `max_entries`
    #[must_use]
    pub fn in_memory(max_entries: u64) -> Self {
        Self::new(Arc::new(MemoryCacheBackend::new(max_entries)))
    }

    /// Set per-operation timeout
    #[inline]
    #[must_use]
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Per-operation timeout
    #[inline]
    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Fetch and decode; any failure is a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// Fetch and decode
    ///
    /// # Errors
    /// Timeout, backend failure or an undecodable entry.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let raw = self
            .bounded("get", self.backend.get(key.as_str()))
            .await?;
        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(CacheError::from)
    }

    /// Encode and store; failures are logged and reported as `false`
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool {
        match self.try_set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "cache write failed");
                false
            }
        }
    }

    /// Encode and store
    ///
    /// # Errors
    /// Serialization failure, timeout or backend failure.
    pub async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value)?;
        self.bounded("set", self.backend.set(key.as_str(), encoded, ttl))
            .await
    }

    /// Drop an entry; failures are logged
    pub async fn invalidate(&self, key: &CacheKey) {
        if let Err(e) = self.bounded("remove", self.backend.remove(key.as_str())).await {
            warn!(key = %key, error = %e, "cache invalidation failed");
        }
    }

    async fn bounded<F, T>(&self, operation: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout {
                operation,
                timeout_ms: u64::try_from(self.io_timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        n: u32,
    }

    fn key(s: &str) -> CacheKey {
        CacheKey(s.to_string())
    }

    #[tokio::test]
    async fn round_trips_typed_values() {
        let cache = ResultCache::in_memory(16);
        assert!(cache.set(&key("k"), &Payload { n: 7 }, Duration::from_secs(60)).await);
        assert_eq!(cache.get::<Payload>(&key("k")).await, Some(Payload { n: 7 }));
        cache.invalidate(&key("k")).await;
        assert_eq!(cache.get::<Payload>(&key("k")).await, None);
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let cache = ResultCache::in_memory(16);
        cache.set(&key("k"), &Payload { n: 1 }, Duration::ZERO).await;
        assert_eq!(cache.get::<Payload>(&key("k")).await, None);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let backend = Arc::new(MemoryCacheBackend::new(16));
        backend
            .set("k", "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = ResultCache::new(backend);
        assert!(cache.try_get::<Payload>(&key("k")).await.is_err());
        assert_eq!(cache.get::<Payload>(&key("k")).await, None);
    }

    #[tokio::test]
    async fn backend_errors_are_misses() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_get()
            .returning(|_| Err(CacheError::backend("connection refused")));
        backend
            .expect_set()
            .returning(|_, _, _| Err(CacheError::backend("connection refused")));
        let cache = ResultCache::new(Arc::new(backend));
        assert_eq!(cache.get::<Payload>(&key("k")).await, None);
        assert!(!cache.set(&key("k"), &Payload { n: 1 }, Duration::from_secs(1)).await);
    }

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl CacheBackend for Stalled {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            futures::future::pending().await
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            futures::future::pending().await
        }
        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_times_out() {
        let cache = ResultCache::new(Arc::new(Stalled)).with_io_timeout(Duration::from_millis(50));
        let err = cache.try_get::<Payload>(&key("k")).await.unwrap_err();
        assert!(matches!(err, CacheError::Timeout { operation: "get", timeout_ms: 50 }));
        assert_eq!(cache.get::<Payload>(&key("k")).await, None);
    }

    #[test]
    fn keys_are_namespaced() {
        let fp = Fingerprint::compute(b"x");
        assert!(CacheKey::context(&fp).as_str().starts_with("ctx:"));
        let doc = CacheKey::document(
            &fp,
            &TemplateKey::new("Jira", "ticket", "react"),
            ResolutionTier::BuiltIn,
            StrategyKind::Emergency,
        );
        assert!(doc.as_str().starts_with("doc:"));
        assert!(doc.as_str().ends_with(":jira/ticket/react:built-in:emergency"));
    }
}
