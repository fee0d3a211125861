//! Image processing stages between intake and inference: letterbox
//! resizing to the model geometry and pixel normalization into the input
//! tensor.

pub mod normalization;
pub mod resize;

pub use normalization::NormalizeImage;
pub use resize::LetterboxResize;
