//! Utility functions shared across the pipeline.

pub mod image;

pub use image::{decode_image, flatten_to_rgb};
