//! Decode, crop, scale and encode
//!
//! Two entry points share the same codec plumbing:
//! - [`ResizePipeline::normalize`] turns fetched origin bytes into the
//!   near-lossless "normalized original" that every later resize starts from.
//! - [`ResizePipeline::resize`] produces a delivery image of exactly the
//!   requested dimensions, center-cropped to the target aspect ratio first.
//!
//! Both are synchronous and CPU bound; async callers run them on the blocking
//! pool. Neither touches the cache.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::trace;

use super::crop_geometry::crop_rect;
use crate::config::ImageConfig;
use crate::errors::{AppError, AppResult};
use crate::models::ImageSize;

/// MIME type of everything the pipeline emits
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct ResizePipeline {
    final_quality: u8,
    normalized_quality: u8,
    normalized_max_edge: u32,
    blur_sigma: f32,
}

impl ResizePipeline {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            final_quality: config.final_quality,
            normalized_quality: config.normalized_quality,
            normalized_max_edge: config.normalized_max_edge,
            blur_sigma: config.normalize_blur_sigma,
        }
    }

    /// Produce the normalized original for raw origin bytes
    pub fn normalize(&self, raw: &[u8]) -> AppResult<Vec<u8>> {
        let mut img = decode(raw)?;

        let longest = img.width().max(img.height());
        if longest > self.normalized_max_edge {
            // `resize` keeps the aspect ratio and fits inside the bounding box
            img = img.resize(
                self.normalized_max_edge,
                self.normalized_max_edge,
                FilterType::Lanczos3,
            );
        }

        if self.blur_sigma > 0.0 {
            img = img.blur(self.blur_sigma);
        }

        trace!(
            "Normalized image to {}x{} (quality {})",
            img.width(),
            img.height(),
            self.normalized_quality
        );
        encode_jpeg(&img, self.normalized_quality)
    }

    /// Crop to the target ratio and scale to exactly `size`
    pub fn resize(&self, raw: &[u8], size: &ImageSize) -> AppResult<Vec<u8>> {
        let img = decode(raw)?;
        let rect = crop_rect(img.width(), img.height(), size.aspect_ratio())?;

        let cropped = if rect.is_full_frame(img.width(), img.height()) {
            img
        } else {
            img.crop_imm(rect.x0, rect.y0, rect.width(), rect.height())
        };

        let resized = cropped.resize_exact(size.width, size.height, FilterType::Lanczos3);

        trace!(
            "Resized {}x{} crop at ({}, {}) to {} ({})",
            rect.width(),
            rect.height(),
            rect.x0,
            rect.y0,
            size.name,
            size
        );
        encode_jpeg(&resized, self.final_quality)
    }
}

impl Default for ResizePipeline {
    fn default() -> Self {
        Self::new(&ImageConfig::default())
    }
}

fn decode(raw: &[u8]) -> AppResult<DynamicImage> {
    image::load_from_memory(raw).map_err(AppError::Decode)
}

/// JPEG has no alpha channel, so everything goes through RGB8
fn encode_jpeg(img: &DynamicImage, quality: u8) -> AppResult<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&rgb).map_err(AppError::Encode)?;
    Ok(buf)
}


#[cfg(test)]
mod tests {
    use super::test_support::png_bytes;
    use super::*;
    use image::GenericImageView;

    fn dimensions(bytes: &[u8]) -> (u32, u32) {
        image::load_from_memory(bytes).unwrap().dimensions()
    }

    #[test]
    fn test_resize_produces_exact_dimensions() {
        let pipeline = ResizePipeline::default();
        let source = png_bytes(300, 240);

        for size in [
            ImageSize::new("wide", 160, 90),
            ImageSize::new("tall", 90, 160),
            ImageSize::new("square", 50, 50),
        ] {
            let output = pipeline.resize(&source, &size).unwrap();
            assert_eq!(dimensions(&output), (size.width, size.height), "{}", size.name);
        }
    }

    #[test]
    fn test_resize_output_is_jpeg() {
        let pipeline = ResizePipeline::default();
        let output = pipeline
            .resize(&png_bytes(64, 64), &ImageSize::new("s", 32, 32))
            .unwrap();

        assert_eq!(
            image::guess_format(&output).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_resize_is_deterministic() {
        let pipeline = ResizePipeline::default();
        let source = png_bytes(120, 80);
        let size = ImageSize::new("s", 40, 40);

        assert_eq!(
            pipeline.resize(&source, &size).unwrap(),
            pipeline.resize(&source, &size).unwrap()
        );
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let pipeline = ResizePipeline::default();
        let result = pipeline.resize(b"<html>not an image</html>", &ImageSize::new("s", 10, 10));
        assert!(matches!(result, Err(AppError::Decode(_))));

        assert!(matches!(pipeline.normalize(&[]), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_normalize_caps_longest_edge() {
        let pipeline = ResizePipeline::new(&ImageConfig {
            normalized_max_edge: 100,
            ..ImageConfig::default()
        });

        let output = pipeline.normalize(&png_bytes(400, 200)).unwrap();
        assert_eq!(dimensions(&output), (100, 50));
    }

    #[test]
    fn test_normalize_never_upscales() {
        let pipeline = ResizePipeline::default();
        let output = pipeline.normalize(&png_bytes(64, 48)).unwrap();
        assert_eq!(dimensions(&output), (64, 48));
    }

    #[test]
    fn test_normalize_with_blur() {
        let pipeline = ResizePipeline::new(&ImageConfig {
            normalize_blur_sigma: 0.8,
            ..ImageConfig::default()
        });

        let output = pipeline.normalize(&png_bytes(64, 48)).unwrap();
        assert_eq!(dimensions(&output), (64, 48));
    }
}
