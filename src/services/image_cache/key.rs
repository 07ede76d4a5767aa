//! Composite cache keys

use std::fmt;

/// Tag used for the normalized-original variant in logs and health output
pub const NORMALIZED_ORIGINAL_TAG: &str = "normalized-original";

/// Which rendition of a source image an entry holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheVariant {
    /// Near-lossless re-encoding of the fetched origin bytes
    NormalizedOriginal,
    /// Finished output for a catalog size, by name
    Size(String),
}

impl fmt::Display for CacheVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheVariant::NormalizedOriginal => f.write_str(NORMALIZED_ORIGINAL_TAG),
            CacheVariant::Size(name) => f.write_str(name),
        }
    }
}

/// `(source url, variant)`; the enum keeps the two variant kinds disjoint even
/// if a size were ever named like the normalized tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source_url: String,
    pub variant: CacheVariant,
}

impl CacheKey {
    pub fn normalized<U: Into<String>>(source_url: U) -> Self {
        Self {
            source_url: source_url.into(),
            variant: CacheVariant::NormalizedOriginal,
        }
    }

    pub fn sized<U: Into<String>, N: Into<String>>(source_url: U, size_name: N) -> Self {
        Self {
            source_url: source_url.into(),
            variant: CacheVariant::Size(size_name.into()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.source_url, self.variant)
    }
}
