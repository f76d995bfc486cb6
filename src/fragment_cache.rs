//! Time-bounded caching of rendered page fragments.
//!
//! Entries are never invalidated on writes: a new post shows up on a cached
//! page only after the entry expires.
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Bytes;
use moka::{future::Cache, Expiry};
use tracing::debug;

use crate::errors::RequestError;

/// Key-value store with per-entry time to live.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Option<Bytes>;
    async fn set(&self, key: String, value: Bytes, ttl: Duration);
}

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    ttl: Duration,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct MokaBackend {
    inner: Cache<String, Entry>,
}

impl MokaBackend {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryExpiry)
                .build(),
        }
    }
}

#[async_trait]
impl CacheBackend for MokaBackend {
    async fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    async fn set(&self, key: String, value: Bytes, ttl: Duration) {
        self.inner.insert(key, Entry { value, ttl }).await;
    }
}

/// Stable identifier of a fragment, optionally varied on request values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentKey(String);

impl FragmentKey {
    pub fn new(name: &str) -> Self {
        Self(format!("fragment.{name}"))
    }

    pub fn vary_on(mut self, value: impl Display) -> Self {
        self.0.push(':');
        self.0.push_str(&value.to_string());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct FragmentCache {
    backend: Arc<dyn CacheBackend>,
}

impl FragmentCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self, key: &FragmentKey) -> Option<Bytes> {
        self.backend.get(key.as_str()).await
    }

    /// Returns the cached fragment, or renders and caches it for `ttl`.
    ///
    /// Two concurrent misses on the same key both render; the later write wins.
    /// A failed render is returned as is and nothing is stored.
    pub async fn get_or_render<F, Fut>(
        &self,
        key: &FragmentKey,
        ttl: Duration,
        render: F,
    ) -> Result<Bytes, RequestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, RequestError>>,
    {
        if let Some(hit) = self.backend.get(key.as_str()).await {
            debug!(key = key.as_str(), "fragment cache hit");
            return Ok(hit);
        }
        debug!(key = key.as_str(), "fragment cache miss");
        let rendered = render().await?;
        self.backend
            .set(key.as_str().to_owned(), rendered.clone(), ttl)
            .await;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> FragmentCache {
        FragmentCache::new(Arc::new(MokaBackend::new(100)))
    }

    async fn render_counting(
        cache: &FragmentCache,
        key: &FragmentKey,
        ttl: Duration,
        calls: &AtomicUsize,
    ) -> Bytes {
        cache
            .get_or_render(key, ttl, || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Bytes::from(format!("render #{n}")))
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_served_from_cache() {
        let cache = cache();
        let key = FragmentKey::new("index_page");
        let calls = AtomicUsize::new(0);

        let first = render_counting(&cache, &key, Duration::from_secs(60), &calls).await;
        let second = render_counting(&cache, &key, Duration::from_secs(60), &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(cache.get(&key).await, Some(first));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let cache = cache();
        let key = FragmentKey::new("index_page");
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_millis(50);

        render_counting(&cache, &key, ttl, &calls).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let again = render_counting(&cache, &key, ttl, &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(again, Bytes::from("render #2"));
    }

    #[tokio::test]
    async fn keys_vary_on_values() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);
        let page_one = FragmentKey::new("index_page").vary_on(1);
        let page_two = FragmentKey::new("index_page").vary_on(2);
        assert_ne!(page_one, page_two);

        render_counting(&cache, &page_one, ttl, &calls).await;
        render_counting(&cache, &page_two, ttl, &calls).await;
        render_counting(&cache, &page_one, ttl, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_render_is_not_cached() {
        let cache = cache();
        let key = FragmentKey::new("broken");
        let result = cache
            .get_or_render(&key, Duration::from_secs(60), || async {
                Err::<Bytes, _>(RequestError::NotFound("Group not found"))
            })
            .await;
        assert!(matches!(result, Err(RequestError::NotFound(_))));
        assert_eq!(cache.get(&key).await, None);
    }
}
