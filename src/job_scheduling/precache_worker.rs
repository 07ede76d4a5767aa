//! Paced workers that warm the cache for the largest catalog size

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::precache_queue::PrecacheQueue;
use crate::errors::AppResult;
use crate::models::ImageSize;
use crate::services::{CacheKey, ImageResolver};
use crate::utils::url::UrlUtils;

#[derive(Clone)]
pub struct PrecacheWorker {
    queue: Arc<PrecacheQueue>,
    resolver: Arc<ImageResolver>,
    size: ImageSize,
    pacing: Duration,
}

impl PrecacheWorker {
    pub fn new(
        queue: Arc<PrecacheQueue>,
        resolver: Arc<ImageResolver>,
        size: ImageSize,
        pacing: Duration,
    ) -> Self {
        Self {
            queue,
            resolver,
            size,
            pacing,
        }
    }

    /// Start `workers` tasks draining the queue until cancelled
    pub fn spawn(&self, workers: usize, cancellation_token: CancellationToken) -> Vec<JoinHandle<()>> {
        info!(
            "Starting {} precache workers for {} (pacing {})",
            workers,
            self.size.name,
            humantime::format_duration(self.pacing)
        );

        (0..workers)
            .map(|worker_id| {
                let worker = self.clone();
                let token = cancellation_token.clone();
                tokio::spawn(async move { worker.run(worker_id, token).await })
            })
            .collect()
    }

    /// Worker loop: take a job, resolve it, sleep for the pacing interval
    ///
    /// URLs that are already cached at the target size finish immediately
    /// and skip the sleep.
    pub async fn run(&self, worker_id: usize, cancellation_token: CancellationToken) {
        while let Some(url) = self.queue.next(&cancellation_token).await {
            let result = self.process(&url).await;
            self.queue.mark_finished(&url, result.is_ok()).await;

            if matches!(result, Ok(false)) {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.pacing) => {}
                _ = cancellation_token.cancelled() => break,
            }
        }

        debug!("Precache worker {} stopped", worker_id);
    }

    /// Resolve one URL at the target size, logging failures
    ///
    /// Returns `Ok(false)` when the output was already cached. Presence is
    /// checked with `contains` so a sweep never counts as a hit or promotes
    /// the entry to the frequent list.
    pub async fn process(&self, url: &str) -> AppResult<bool> {
        let display_url = UrlUtils::obfuscate_credentials(url);

        let key = CacheKey::sized(url, &self.size.name);
        if self.resolver.cache().contains(&key).await {
            trace!("Already cached {} at {}", display_url, self.size.name);
            return Ok(false);
        }

        match self.resolver.resolve(url, &self.size).await {
            Ok(bytes) => {
                debug!(
                    "Precached {} at {} ({} bytes)",
                    display_url,
                    self.size.name,
                    bytes.len()
                );
                Ok(true)
            }
            Err(e) => {
                warn!("Precache failed for {}: {}", display_url, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::image_fetcher::test_support::FakeFetcher;
    use crate::services::image_pipeline::test_support::png_bytes;
    use crate::services::{ImageCache, ResizePipeline};

    const GOOD: &str = "https://example.com/good.png";
    const BROKEN: &str = "https://example.com/broken.png";

    fn worker_with(fetcher: Arc<FakeFetcher>, queue: Arc<PrecacheQueue>) -> PrecacheWorker {
        let resolver = Arc::new(ImageResolver::new(
            Arc::new(ImageCache::new(16).unwrap()),
            fetcher,
            ResizePipeline::default(),
        ));
        PrecacheWorker::new(
            queue,
            resolver,
            ImageSize::new("largest", 48, 27),
            Duration::ZERO,
        )
    }

    async fn wait_for_finished(queue: &PrecacheQueue, expected: u64) {
        for _ in 0..200 {
            let stats = queue.stats().await;
            if stats.completed + stats.failed >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("precache jobs did not finish in time");
    }

    #[tokio::test]
    async fn test_workers_store_normalized_and_largest() {
        let fetcher = Arc::new(FakeFetcher::new().with_body(GOOD, png_bytes(96, 96)));
        let queue = Arc::new(PrecacheQueue::new());
        let worker = worker_with(fetcher, queue.clone());
        let token = CancellationToken::new();

        let handles = worker.spawn(2, token.clone());
        queue.enqueue(GOOD.to_string()).await;
        wait_for_finished(&queue, 1).await;

        let cache = worker.resolver.cache();
        assert!(cache.contains(&CacheKey::normalized(GOOD)).await);
        assert!(cache.contains(&CacheKey::sized(GOOD, "largest")).await);

        token.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_failed_job_is_counted_and_worker_continues() {
        let fetcher = Arc::new(FakeFetcher::new().with_body(GOOD, png_bytes(64, 64)));
        let queue = Arc::new(PrecacheQueue::new());
        let worker = worker_with(fetcher, queue.clone());
        let token = CancellationToken::new();

        let handles = worker.spawn(1, token.clone());
        queue
            .enqueue_all(vec![BROKEN.to_string(), GOOD.to_string()])
            .await;
        wait_for_finished(&queue, 2).await;

        let stats = queue.stats().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 0);

        token.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_repeated_sweeps_do_not_promote_entries() {
        let urls: Vec<String> = (0..3)
            .map(|i| format!("https://example.com/{i}.png"))
            .collect();
        let fetcher = urls
            .iter()
            .fold(FakeFetcher::new(), |fetcher, url| {
                fetcher.with_body(url, png_bytes(64, 48))
            });
        let fetcher = Arc::new(fetcher);
        let worker = worker_with(fetcher.clone(), Arc::new(PrecacheQueue::new()));

        for url in &urls {
            assert!(worker.process(url).await.unwrap());
        }
        for url in &urls {
            assert!(!worker.process(url).await.unwrap());
        }

        let stats = worker.resolver.cache().stats().await;
        assert_eq!(stats.frequent_entries, 0);
        assert_eq!(stats.recent_entries, 6);
        assert_eq!(stats.hits, 0);
        assert_eq!(fetcher.call_count(), 3);
    }
}
