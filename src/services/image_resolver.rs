//! Cache-or-compute resolution of `(source url, size)` to finished bytes
//!
//! Lookup order:
//! 1. finished output for `(url, size)`
//! 2. normalized original for `url`, fetched and normalized on a miss
//! 3. resize the normalized copy to `size` and store it
//!
//! Two callers missing the same key at once both compute it; the later put
//! overwrites an equivalent value. Shared by the request path and the
//! precache workers.

use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use super::image_cache::{CacheKey, ImageCache};
use super::image_fetcher::ImageFetcher;
use super::image_pipeline::ResizePipeline;
use crate::errors::{AppError, AppResult};
use crate::models::ImageSize;
use crate::utils::url::UrlUtils;

pub struct ImageResolver {
    cache: Arc<ImageCache>,
    fetcher: Arc<dyn ImageFetcher>,
    pipeline: Arc<ResizePipeline>,
}

impl ImageResolver {
    pub fn new(
        cache: Arc<ImageCache>,
        fetcher: Arc<dyn ImageFetcher>,
        pipeline: ResizePipeline,
    ) -> Self {
        Self {
            cache,
            fetcher,
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.cache
    }

    /// Finished bytes for `url` at `size`
    pub async fn resolve(&self, url: &str, size: &ImageSize) -> AppResult<Bytes> {
        let key = CacheKey::sized(url, &size.name);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let normalized = self.normalized_original(url).await?;

        let pipeline = self.pipeline.clone();
        let target = size.clone();
        let output = run_blocking(move || pipeline.resize(&normalized, &target)).await?;
        let output = Bytes::from(output);

        debug!(
            "Rendered {} for {} ({} bytes)",
            size.name,
            UrlUtils::obfuscate_credentials(url),
            output.len()
        );
        self.cache.put(key, output.clone()).await;
        Ok(output)
    }

    /// Normalized original for `url`, fetching it on a miss
    pub async fn normalized_original(&self, url: &str) -> AppResult<Bytes> {
        let key = CacheKey::normalized(url);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let raw = self.fetcher.fetch(url).await?;
        let raw_len = raw.len();

        let pipeline = self.pipeline.clone();
        let normalized = Bytes::from(run_blocking(move || pipeline.normalize(&raw)).await?);

        debug!(
            "Normalized {} ({} raw bytes -> {} bytes)",
            UrlUtils::obfuscate_credentials(url),
            raw_len,
            normalized.len()
        );
        self.cache.put(key, normalized.clone()).await;
        Ok(normalized)
    }
}

/// Run CPU-bound image work off the async workers
async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal(format!("image task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::image_pipeline::test_support::png_bytes;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        body: Option<Bytes>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn serving(body: Vec<u8>) -> Self {
            Self {
                body: Some(Bytes::from(body)),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> AppResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body
                .clone()
                .ok_or_else(|| AppError::fetch(url, "connection refused"))
        }
    }

    fn resolver_with(fetcher: Arc<CountingFetcher>) -> ImageResolver {
        ImageResolver::new(
            Arc::new(ImageCache::new(16).unwrap()),
            fetcher,
            ResizePipeline::default(),
        )
    }

    #[tokio::test]
    async fn test_second_resolve_is_a_cache_hit_with_identical_bytes() {
        let fetcher = Arc::new(CountingFetcher::serving(png_bytes(200, 150)));
        let resolver = resolver_with(fetcher.clone());
        let size = ImageSize::new("small", 64, 36);

        let first = resolver.resolve("https://example.com/a.png", &size).await.unwrap();
        let hits_before = resolver.cache().stats().await.hits;
        let second = resolver.resolve("https://example.com/a.png", &size).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.cache().stats().await.hits, hits_before + 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_sizes_reuse_normalized_original() {
        let fetcher = Arc::new(CountingFetcher::serving(png_bytes(200, 150)));
        let resolver = resolver_with(fetcher.clone());
        let url = "https://example.com/a.png";

        resolver.resolve(url, &ImageSize::new("wide", 64, 36)).await.unwrap();
        resolver.resolve(url, &ImageSize::new("tall", 36, 64)).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        let cache = resolver.cache();
        assert!(cache.contains(&CacheKey::normalized(url)).await);
        assert!(cache.contains(&CacheKey::sized(url, "wide")).await);
        assert!(cache.contains(&CacheKey::sized(url, "tall")).await);
    }

    #[tokio::test]
    async fn test_fetch_failure_caches_nothing() {
        let fetcher = Arc::new(CountingFetcher::failing());
        let resolver = resolver_with(fetcher.clone());

        let result = resolver
            .resolve("https://example.com/gone.png", &ImageSize::new("s", 10, 10))
            .await;

        assert!(matches!(result, Err(AppError::Fetch { .. })));
        assert_eq!(resolver.cache().stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_undecodable_source_is_a_decode_error() {
        let fetcher = Arc::new(CountingFetcher::serving(b"<!doctype html>".to_vec()));
        let resolver = resolver_with(fetcher);

        let result = resolver
            .resolve("https://example.com/page", &ImageSize::new("s", 10, 10))
            .await;

        assert!(matches!(result, Err(AppError::Decode(_))));
        assert_eq!(resolver.cache().stats().await.entries, 0);
    }
}
