//! In-memory image cache
//!
//! A pure byte store keyed by `(source url, variant)`:
//! - one "normalized original" per source, so repeated resizes never refetch
//! - one finished output per `(source, size)`
//!
//! Eviction uses adaptive replacement so a burst of one-off lookups (a fresh
//! rotation being precached, say) cannot flush the sizes that are actually
//! being requested.

pub mod arc;
pub mod key;
pub mod service;

pub use arc::ArcCache;
pub use key::{CacheKey, CacheVariant, NORMALIZED_ORIGINAL_TAG};
pub use service::{ImageCache, ImageCacheStats};
