//! Periodic source discovery and pool replacement

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::precache_queue::PrecacheQueue;
use super::types::{RefreshStatus, SharedRefreshStatus};
use crate::errors::{AppError, AppResult};
use crate::services::SourcePool;
use crate::sources::SourceDiscovery;

/// Consecutive failures after which a failed refresh is logged as an error
const ESCALATE_AFTER_FAILURES: u32 = 3;

pub struct SourceRefresher {
    discovery: Arc<dyn SourceDiscovery>,
    pool: SourcePool,
    precache_queue: Arc<PrecacheQueue>,
    status: SharedRefreshStatus,
    interval: Duration,
}

impl SourceRefresher {
    pub fn new(
        discovery: Arc<dyn SourceDiscovery>,
        pool: SourcePool,
        precache_queue: Arc<PrecacheQueue>,
        interval: Duration,
    ) -> Self {
        let status = Arc::new(RwLock::new(RefreshStatus::new(discovery.name())));
        Self {
            discovery,
            pool,
            precache_queue,
            status,
            interval,
        }
    }

    /// Handle for reading the refresh status elsewhere
    pub fn status(&self) -> SharedRefreshStatus {
        self.status.clone()
    }

    /// Run one discovery round
    ///
    /// On success the pool is replaced and the new list queued for
    /// precaching. On failure the pool is left untouched.
    pub async fn refresh_once(&self) -> AppResult<usize> {
        let result = match self.discovery.discover().await {
            Ok(urls) if urls.is_empty() => Err(AppError::discovery_parse(
                "discovery returned no source URLs",
            )),
            other => other,
        };

        let urls = match result {
            Ok(urls) => urls,
            Err(e) => {
                let failures = {
                    let mut status = self.status.write().await;
                    status.record_failure(Utc::now(), e.to_string());
                    status.consecutive_failures
                };
                if failures >= ESCALATE_AFTER_FAILURES {
                    error!(
                        "Source refresh via {} failed {} times in a row: {}",
                        self.discovery.name(),
                        failures,
                        e
                    );
                } else {
                    warn!("Source refresh via {} failed: {}", self.discovery.name(), e);
                }
                return Err(e);
            }
        };

        let pool_size = urls.len();
        self.pool.replace(urls.clone()).await;
        self.status.write().await.record_success(Utc::now(), pool_size);

        let queued = self.precache_queue.enqueue_all(urls).await;
        info!(
            "Source refresh via {} complete: {} URLs, {} queued for precaching",
            self.discovery.name(),
            pool_size,
            queued
        );
        Ok(pool_size)
    }

    /// Refresh now, then again `interval` after each round finishes
    pub async fn run(&self, cancellation_token: CancellationToken) {
        info!(
            "Starting source refresh loop (every {})",
            humantime::format_duration(self.interval)
        );

        loop {
            // Failures are already logged and recorded in the status
            let _ = self.refresh_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancellation_token.cancelled() => {
                    info!("Source refresh loop received cancellation signal, shutting down");
                    break;
                }
            }
        }
    }
}
