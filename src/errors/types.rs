//! Error type definitions for the backdrop server

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Bytes were not a raster image the decoder understands
    #[error("Decode error: {0}")]
    Decode(#[source] image::ImageError),

    /// Processed pixels could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[source] image::ImageError),

    /// Network or origin failure while fetching source bytes
    #[error("Fetch error: {url} - {message}")]
    Fetch { url: String, message: String },

    /// The discovery page no longer has the structure we expect
    #[error("Discovery parse error: {message}")]
    DiscoveryParse { message: String },

    /// Client asked for a size name that is not in the catalog
    #[error("Unknown size '{requested}', expected one of: {}", valid.join(", "))]
    UnknownSize { requested: String, valid: Vec<String> },

    /// No source URLs are known yet
    #[error("Source pool is empty")]
    PoolEmpty,

    /// Invalid input to the cropping geometry
    #[error("Geometry error: {message}")]
    Geometry { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a fetch error for a source URL
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a discovery parse error
    pub fn discovery_parse<S: Into<String>>(message: S) -> Self {
        Self::DiscoveryParse {
            message: message.into(),
        }
    }

    /// Create a geometry error
    pub fn geometry<S: Into<String>>(message: S) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller is at fault (as opposed to the service or the origin)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownSize { .. })
    }
}
