//! Health check handler

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job_scheduling::{PrecacheStats, RefreshStatus};
use crate::services::ImageCacheStats;
use crate::web::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` while the pool has sources, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub pool_size: usize,
    pub sizes: Vec<String>,
    pub refresh: RefreshStatus,
    pub cache: ImageCacheStats,
    pub precache: PrecacheStats,
}

/// `GET /health`
///
/// Always 200; an empty pool is reported through `status`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool_size = state.pool.len().await;
    let refresh = state.refresh_status.read().await.clone();

    Json(HealthResponse {
        status: if pool_size > 0 { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        pool_size,
        sizes: state.dispatcher.catalog().names(),
        refresh,
        cache: state.cache.stats().await,
        precache: state.precache_queue.stats().await,
    })
}
