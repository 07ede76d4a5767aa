//! Request-time selection of a random source at a named size

use bytes::Bytes;
use std::sync::Arc;
use tracing::warn;

use super::image_resolver::ImageResolver;
use super::source_pool::SourcePool;
use crate::errors::{AppError, AppResult};
use crate::models::{ImageSize, SizeCatalog};
use crate::utils::url::UrlUtils;

/// Picks a source from the pool and resolves it at the requested size
pub struct ImageDispatcher {
    catalog: Arc<SizeCatalog>,
    pool: SourcePool,
    resolver: Arc<ImageResolver>,
}

impl ImageDispatcher {
    pub fn new(catalog: Arc<SizeCatalog>, pool: SourcePool, resolver: Arc<ImageResolver>) -> Self {
        Self {
            catalog,
            pool,
            resolver,
        }
    }

    pub fn catalog(&self) -> &SizeCatalog {
        &self.catalog
    }

    pub fn largest_size(&self) -> &ImageSize {
        self.catalog.largest()
    }

    /// Serve one image for `size_name`
    ///
    /// Unknown names fail with [`AppError::UnknownSize`]; an empty pool fails
    /// with [`AppError::PoolEmpty`] before anything is fetched or decoded.
    pub async fn dispatch(&self, size_name: &str) -> AppResult<Bytes> {
        let size = self
            .catalog
            .get(size_name)
            .ok_or_else(|| AppError::UnknownSize {
                requested: size_name.to_string(),
                valid: self.catalog.names(),
            })?;

        let url = self.pool.pick_random().await.ok_or(AppError::PoolEmpty)?;

        self.resolver.resolve(&url, size).await.inspect_err(|e| {
            warn!(
                "Failed to serve {} from {}: {}",
                size.name,
                UrlUtils::obfuscate_credentials(&url),
                e
            );
        })
    }
}
