//! Job scheduling type definitions

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of the most recent source refreshes
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RefreshStatus {
    /// Discovery provider name
    pub provider: String,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    /// Pool size after the last successful refresh
    pub last_pool_size: usize,
}

impl RefreshStatus {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, at: DateTime<Utc>, pool_size: usize) {
        self.last_attempt_at = Some(at);
        self.last_success_at = Some(at);
        self.last_error = None;
        self.consecutive_failures = 0;
        self.last_pool_size = pool_size;
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>, error: impl Into<String>) {
        self.last_attempt_at = Some(at);
        self.last_error = Some(error.into());
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }
}

/// Refresh status shared between the refresh loop and the health endpoint
pub type SharedRefreshStatus = Arc<RwLock<RefreshStatus>>;

/// Precache queue counters
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PrecacheStats {
    /// Jobs accepted into the queue (duplicates excluded)
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
    /// Jobs waiting for a worker
    pub pending: usize,
    /// Jobs currently being worked on
    pub running: usize,
}
