//! Image delivery services
//!
//! Leaves first: crop geometry, the resize pipeline, the ARC-backed image
//! cache, the source pool, then the resolver and dispatcher that tie them
//! together on the request path.

pub mod crop_geometry;
pub mod dispatcher;
pub mod image_cache;
pub mod image_fetcher;
pub mod image_pipeline;
pub mod image_resolver;
pub mod source_pool;

pub use crop_geometry::{CropRect, crop_rect};
pub use dispatcher::ImageDispatcher;
pub use image_cache::{CacheKey, CacheVariant, ImageCache, ImageCacheStats};
pub use image_fetcher::{HttpImageFetcher, ImageFetcher, build_http_client};
pub use image_pipeline::{OUTPUT_CONTENT_TYPE, ResizePipeline};
pub use image_resolver::ImageResolver;
pub use source_pool::SourcePool;
