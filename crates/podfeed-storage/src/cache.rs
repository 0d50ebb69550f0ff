//! Namespaced TTL cache for resolved media URLs and rendered feeds.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::KvBackend;
use crate::error::StorageResult;

/// Namespace for resolved direct media URLs.
pub const VIDEO_URLS_NAMESPACE: &str = "video_urls";
/// Namespace for serialized feed documents.
pub const FEEDS_NAMESPACE: &str = "feeds";

pub const VIDEO_URLS_TTL: Duration = Duration::from_secs(3 * 60 * 60);
pub const FEEDS_TTL: Duration = Duration::from_secs(3 * 60);

/// Read-through string cache shared by the resolver and the feed service.
#[derive(Clone)]
pub struct ResolveCache {
    backend: Arc<dyn KvBackend>,
}

impl ResolveCache {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn cache_key(namespace: &str, key: &str) -> String {
        format!("cache:{}:{}", namespace, key)
    }

    /// Store `value` under `namespace`/`key`, overwriting any previous entry.
    pub async fn cache(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StorageResult<()> {
        self.backend
            .set_ex(&Self::cache_key(namespace, key), value, ttl)
            .await
    }

    /// Cached value, or `None` if absent or expired.
    pub async fn get_cached(&self, namespace: &str, key: &str) -> StorageResult<Option<String>> {
        self.backend.get(&Self::cache_key(namespace, key)).await
    }

    /// Return the cached value or run `compute` and cache its result.
    ///
    /// Backend failures degrade to a miss: the value is still computed and
    /// returned, the failure is only logged.
    pub async fn cached_resolve<F, Fut, E>(
        &self,
        namespace: &str,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        match self.get_cached(namespace, key).await {
            Ok(Some(value)) => {
                metrics::counter!("podfeed_cache_hits_total", "namespace" => namespace.to_string())
                    .increment(1);
                debug!(namespace, key, "cache hit");
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) => warn!(namespace, key, error = %e, "cache read failed"),
        }

        metrics::counter!("podfeed_cache_misses_total", "namespace" => namespace.to_string())
            .increment(1);

        let value = compute().await?;

        if let Err(e) = self.cache(namespace, key, &value, ttl).await {
            warn!(namespace, key, error = %e, "cache write failed");
        }

        Ok(value)
    }
}
