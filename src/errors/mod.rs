//! Centralized error handling for the backdrop server
//!
//! Every fallible operation in the image pipeline, cache, discovery and
//! dispatch layers returns [`AppError`]. The web layer maps these onto the
//! three outcomes a client can observe: an image, a client error listing the
//! valid size names, or a generic retry-later response.
//!
//! # Usage
//!
//! ```rust
//! use backdrop_server::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::PoolEmpty)
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
