//! Image decoding helpers.
//!
//! Uploaded bytes arrive in any of the allow-listed raster formats and in
//! any color mode; everything downstream works on 8-bit RGB. Transparent
//! images are flattened onto a white background rather than having their
//! alpha channel dropped, so transparent regions read as white instead of
//! black in the classifier input.

use crate::core::errors::{ScreenError, ScreenResult};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Decodes raw upload bytes into an RGB image.
///
/// The format is sniffed from the bytes themselves, not the declared
/// filename, so a mislabeled or truncated payload fails here with
/// `ScreenError::CorruptImage`.
///
/// # Arguments
///
/// * `bytes` - The raw upload payload.
///
/// # Returns
///
/// * `Ok(RgbImage)` - The decoded image, alpha flattened if present.
/// * `Err(ScreenError)` - A `CorruptImage` error when decoding fails.
pub fn decode_image(bytes: &[u8]) -> ScreenResult<RgbImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ScreenError::corrupt_image("failed to decode upload bytes", e))?;
    Ok(flatten_to_rgb(img))
}

/// Converts a DynamicImage to RGB, compositing any alpha channel onto a
/// white background.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if img.color().has_alpha() {
        flatten_onto_white(&img.to_rgba8())
    } else {
        img.to_rgb8()
    }
}

/// Alpha-composites an RGBA image over an opaque white canvas.
fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u16;
        let mut flat = [0u8; 3];
        for (channel, value) in flat.iter_mut().enumerate() {
            let src = pixel[channel] as u16;
            *value = ((src * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        }
        out.put_pixel(x, y, Rgb(flat));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_valid_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([10, 20, 30])));
        let decoded = decode_image(&png_bytes(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = decode_image(b"this is not an image").unwrap_err();
        assert!(matches!(err, ScreenError::CorruptImage { .. }));
    }

    #[test]
    fn rejects_truncated_payload() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])));
        let bytes = png_bytes(&img);
        let err = decode_image(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ScreenError::CorruptImage { .. }));
    }

    #[test]
    fn fully_transparent_pixels_become_white() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([200, 0, 0, 0]));
        let flat = flatten_to_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn opaque_pixels_keep_their_color() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([200, 50, 10, 255]));
        let flat = flatten_to_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([200, 50, 10]));
    }
}
