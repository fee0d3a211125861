//! Aspect-preserving letterbox resize to the model's fixed geometry.
//!
//! The resize policy is fixed and documented because it affects
//! classification results: the image is scaled with Lanczos3 filtering so
//! its longer side fits the target, then centered on a canvas of exactly
//! the target dimensions, padding the remainder with a configurable
//! color. Faces are never distorted or cropped, only framed.

use crate::core::errors::{ScreenError, ScreenResult};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Letterboxes images to a fixed width and height.
#[derive(Debug, Clone)]
pub struct LetterboxResize {
    /// Target width in pixels.
    target_width: u32,
    /// Target height in pixels.
    target_height: u32,
    /// Color used for the padded border.
    pad_color: Rgb<u8>,
}

impl LetterboxResize {
    /// Creates a new LetterboxResize for the given target geometry.
    ///
    /// # Arguments
    ///
    /// * `target_width` - Output width in pixels, greater than 0.
    /// * `target_height` - Output height in pixels, greater than 0.
    /// * `pad_color` - RGB color for the letterbox border.
    ///
    /// # Returns
    ///
    /// A Result containing the resizer or a `ScreenError::Config` when a
    /// target dimension is zero.
    pub fn new(target_width: u32, target_height: u32, pad_color: [u8; 3]) -> ScreenResult<Self> {
        if target_width == 0 || target_height == 0 {
            return Err(ScreenError::config(
                "letterbox target dimensions must be greater than 0",
            ));
        }
        Ok(Self {
            target_width,
            target_height,
            pad_color: Rgb(pad_color),
        })
    }

    /// Scales and pads the image to exactly the target dimensions.
    ///
    /// The output always has the configured dimensions regardless of the
    /// source aspect ratio; an image already at the target size passes
    /// through a no-op scale.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let (width, height) = img.dimensions();

        let scale = (self.target_width as f64 / width as f64)
            .min(self.target_height as f64 / height as f64);
        let scaled_width = ((width as f64 * scale).round() as u32)
            .clamp(1, self.target_width);
        let scaled_height = ((height as f64 * scale).round() as u32)
            .clamp(1, self.target_height);

        let resized = if (scaled_width, scaled_height) == (width, height) {
            img.clone()
        } else {
            imageops::resize(img, scaled_width, scaled_height, FilterType::Lanczos3)
        };

        if (scaled_width, scaled_height) == (self.target_width, self.target_height) {
            return resized;
        }

        let mut canvas =
            RgbImage::from_pixel(self.target_width, self.target_height, self.pad_color);
        let pad_x = (self.target_width - scaled_width) / 2;
        let pad_y = (self.target_height - scaled_height) / 2;
        imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
        canvas
    }
}
