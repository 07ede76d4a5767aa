//! Named target dimensions and the catalog that holds them

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::errors::{AppError, AppResult};

/// A named output dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageSize {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new<S: Into<String>>(name: S, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// Pixel count, used to pick the largest size
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Ordered set of sizes with unique names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCatalog {
    sizes: Vec<ImageSize>,
}

impl SizeCatalog {
    /// Build a catalog, rejecting empty lists, zero dimensions and duplicate names
    pub fn new(sizes: Vec<ImageSize>) -> AppResult<Self> {
        if sizes.is_empty() {
            return Err(AppError::configuration("size catalog must not be empty"));
        }

        let mut seen = HashSet::new();
        for size in &sizes {
            if size.width == 0 || size.height == 0 {
                return Err(AppError::configuration(format!(
                    "size '{}' has a zero dimension ({})",
                    size.name, size
                )));
            }
            if !seen.insert(size.name.as_str()) {
                return Err(AppError::configuration(format!(
                    "duplicate size name '{}'",
                    size.name
                )));
            }
        }

        Ok(Self { sizes })
    }

    /// The catalog served in production
    pub fn standard() -> Self {
        Self {
            sizes: vec![
                ImageSize::new("1080p", 1920, 1080),
                ImageSize::new("tablet-landscape", 1024, 768),
                ImageSize::new("tablet-portrait", 768, 1024),
                ImageSize::new("phone-landscape", 640, 360),
                ImageSize::new("phone-portrait", 360, 640),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ImageSize> {
        self.sizes.iter().find(|size| size.name == name)
    }

    /// Largest by area; ties go to the earliest entry
    pub fn largest(&self) -> &ImageSize {
        let mut largest = &self.sizes[0];
        for size in &self.sizes[1..] {
            if size.area() > largest.area() {
                largest = size;
            }
        }
        largest
    }

    pub fn names(&self) -> Vec<String> {
        self.sizes.iter().map(|size| size.name.clone()).collect()
    }

    /// Comma separated size names, in catalog order
    pub fn describe(&self) -> String {
        self.names().join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSize> {
        self.sizes.iter()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl Default for SizeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
