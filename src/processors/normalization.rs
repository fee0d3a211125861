//! Pixel normalization into the model input tensor.
//!
//! The deployed classifier was trained on `[0, 1]`-scaled RGB input, so
//! the default scale is `1/255` with no mean/std shift. The channel
//! layout follows the configuration: channels-last for Keras-exported
//! artifacts, channels-first for torch-exported ones.

use crate::core::config::ChannelOrder;
use crate::core::errors::{ScreenError, ScreenResult};
use crate::core::Tensor4D;
use image::RgbImage;
use ndarray::Array4;

/// Converts letterboxed RGB images into normalized input tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Multiplier applied to each 8-bit channel value.
    scale: f32,
    /// Channel layout of the produced tensor.
    order: ChannelOrder,
}

impl NormalizeImage {
    /// Creates a new NormalizeImage.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0).
    /// * `order` - Channel layout of the produced tensor.
    ///
    /// # Returns
    ///
    /// A Result containing the normalizer or a `ScreenError::Config` when
    /// the scale is not a positive finite value.
    pub fn new(scale: Option<f32>, order: ChannelOrder) -> ScreenResult<Self> {
        let scale = scale.unwrap_or(1.0 / 255.0);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ScreenError::config(format!(
                "normalization scale must be a positive finite value, got {scale}"
            )));
        }
        Ok(Self { scale, order })
    }

    /// Converts one image into a single-item batch tensor.
    ///
    /// The output shape is `(1, H, W, 3)` for `HWC` or `(1, 3, H, W)` for
    /// `CHW`, with every value in `[0, scale * 255]`.
    pub fn to_tensor(&self, img: &RgbImage) -> Tensor4D {
        let (width, height) = img.dimensions();
        let (h, w) = (height as usize, width as usize);

        let mut tensor = match self.order {
            ChannelOrder::HWC => Array4::zeros((1, h, w, 3)),
            ChannelOrder::CHW => Array4::zeros((1, 3, h, w)),
        };

        for (x, y, pixel) in img.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for channel in 0..3 {
                let value = pixel[channel] as f32 * self.scale;
                match self.order {
                    ChannelOrder::HWC => tensor[[0, y, x, channel]] = value,
                    ChannelOrder::CHW => tensor[[0, channel, y, x]] = value,
                }
            }
        }

        tensor
    }
}
