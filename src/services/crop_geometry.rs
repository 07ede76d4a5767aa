//! Centered crop rectangles for aspect-ratio conversion
//!
//! Given a source of `width x height` and a target aspect ratio, keep the full
//! extent along one axis and trim the other symmetrically. The trimmed length
//! is rounded half-up exactly once, so the resulting rectangle is within one
//! pixel of the requested ratio and never drifts from compounding error.

use serde::Serialize;

use crate::errors::{AppError, AppResult};

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// True when the rectangle covers the whole `width x height` frame
    pub fn is_full_frame(&self, width: u32, height: u32) -> bool {
        *self == Self::new(0, 0, width, height)
    }
}

/// Round half-up, clamped to `[1, max]`
fn rounded_length(value: f64, max: u32) -> u32 {
    let rounded = (value + 0.5).floor();
    if rounded < 1.0 {
        1
    } else if rounded >= f64::from(max) {
        max
    } else {
        rounded as u32
    }
}

/// Compute the centered crop of a `width x height` image for `target_ratio`
pub fn crop_rect(width: u32, height: u32, target_ratio: f64) -> AppResult<CropRect> {
    if width == 0 || height == 0 {
        return Err(AppError::geometry(format!(
            "source dimensions must be positive, got {width}x{height}"
        )));
    }
    if !target_ratio.is_finite() || target_ratio <= 0.0 {
        return Err(AppError::geometry(format!(
            "target aspect ratio must be positive and finite, got {target_ratio}"
        )));
    }

    let original_ratio = f64::from(width) / f64::from(height);

    if original_ratio < target_ratio {
        // Relatively taller than the target: keep width, trim top and bottom
        let crop_height = rounded_length(f64::from(width) / target_ratio, height);
        let y0 = (height - crop_height) / 2;
        Ok(CropRect::new(0, y0, width, y0 + crop_height))
    } else if original_ratio > target_ratio {
        // Relatively wider: keep height, trim left and right
        let crop_width = rounded_length(f64::from(height) * target_ratio, width);
        let x0 = (width - crop_width) / 2;
        Ok(CropRect::new(x0, 0, x0 + crop_width, height))
    } else {
        Ok(CropRect::new(0, 0, width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD_RATIO: f64 = 1920.0 / 1080.0;

    #[test]
    fn test_taller_source_is_trimmed_vertically() {
        assert_eq!(
            crop_rect(3000, 2402, HD_RATIO).unwrap(),
            CropRect::new(0, 357, 3000, 357 + 1688)
        );
    }

    #[test]
    fn test_portrait_source_to_landscape_target() {
        assert_eq!(
            crop_rect(2402, 3000, HD_RATIO).unwrap(),
            CropRect::new(0, 824, 2402, 824 + 1351)
        );
    }

    #[test]
    fn test_wider_source_is_trimmed_horizontally() {
        assert_eq!(
            crop_rect(3000, 1000, HD_RATIO).unwrap(),
            CropRect::new(611, 0, 2389, 1000)
        );
    }

    #[test]
    fn test_wider_source_to_portrait_target() {
        assert_eq!(
            crop_rect(2402, 3000, 360.0 / 640.0).unwrap(),
            CropRect::new(357, 0, 357 + 1688, 3000)
        );
    }

    #[test]
    fn test_matching_ratio_is_full_frame() {
        let rect = crop_rect(1920, 1080, HD_RATIO).unwrap();
        assert!(rect.is_full_frame(1920, 1080));
    }

    #[test]
    fn test_degenerate_sources_never_produce_empty_rectangles() {
        let rect = crop_rect(1, 10_000, 1000.0).unwrap();
        assert_eq!(rect.height(), 1);
        assert_eq!(rect.width(), 1);

        let rect = crop_rect(10_000, 1, 0.001).unwrap();
        assert_eq!(rect.width(), 1);
        assert_eq!(rect.height(), 1);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert!(crop_rect(0, 100, 1.0).is_err());
        assert!(crop_rect(100, 0, 1.0).is_err());
        assert!(crop_rect(100, 100, 0.0).is_err());
        assert!(crop_rect(100, 100, f64::NAN).is_err());
        assert!(crop_rect(100, 100, f64::INFINITY).is_err());
    }
}
