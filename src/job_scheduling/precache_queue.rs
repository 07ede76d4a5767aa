//! FIFO precache queue with URL deduplication

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::PrecacheStats;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    /// URLs that are pending or running
    job_keys: HashSet<String>,
    running: usize,
}

/// Thread-safe queue of source URLs waiting to be precached
///
/// A URL stays tracked from [`enqueue`](Self::enqueue) until a worker calls
/// [`mark_finished`](Self::mark_finished), so a refresh that repeats a URL
/// still being worked on does not queue it again.
#[derive(Debug, Default)]
pub struct PrecacheQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl PrecacheQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a URL unless it is already tracked
    /// Returns true if it was added
    pub async fn enqueue(&self, url: String) -> bool {
        let added = {
            let mut state = self.state.lock().await;
            if state.job_keys.contains(&url) {
                debug!("Skipping duplicate precache job for {}", url);
                false
            } else {
                state.job_keys.insert(url.clone());
                state.pending.push_back(url);
                true
            }
        };

        if added {
            self.enqueued.fetch_add(1, Ordering::Relaxed);
            self.notify.notify_waiters();
        }
        added
    }

    /// Enqueue a whole URL list, returning how many were new
    pub async fn enqueue_all<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for url in urls {
            if self.enqueue(url).await {
                added += 1;
            }
        }
        added
    }

    async fn try_take(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let url = state.pending.pop_front()?;
        state.running += 1;
        Some(url)
    }

    /// Wait for the next job; `None` once cancelled
    pub async fn next(&self, cancellation_token: &CancellationToken) -> Option<String> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so an enqueue in between is not missed
            notified.as_mut().enable();

            if cancellation_token.is_cancelled() {
                return None;
            }
            if let Some(url) = self.try_take().await {
                return Some(url);
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancellation_token.cancelled() => return None,
            }
        }
    }

    /// Release a job taken with [`next`](Self::next) and count its outcome
    pub async fn mark_finished(&self, url: &str, succeeded: bool) {
        {
            let mut state = self.state.lock().await;
            state.job_keys.remove(url);
            state.running = state.running.saturating_sub(1);
        }

        if succeeded {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn stats(&self) -> PrecacheStats {
        let state = self.state.lock().await;
        PrecacheStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            pending: state.pending.len(),
            running: state.running,
        }
    }
}
