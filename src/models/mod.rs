//! Domain models shared across the pipeline, cache and web layers

pub mod image_size;

pub use image_size::{ImageSize, SizeCatalog};
