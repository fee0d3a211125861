//! Configuration for the screening pipeline.
//!
//! This module defines the options consumed by the pipeline: upload
//! limits, the image-format allow-list, the model artifact location, the
//! fixed input tensor geometry, and inference session settings. All
//! options are enumerated fields with defaults matching the deployed
//! screening model, and a validation method catches inconsistent values
//! before the pipeline is constructed.

use crate::core::errors::{ScreenError, ScreenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Specifies the order of channels in the model input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Channels-last layout `(batch, height, width, channels)`.
    HWC,
    /// Channels-first layout `(batch, channels, height, width)`.
    CHW,
}

/// The fixed spatial geometry the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDims {
    /// Target height in pixels.
    pub height: u32,
    /// Target width in pixels.
    pub width: u32,
    /// Number of color channels.
    pub channels: u32,
}

impl InputDims {
    /// Creates a new InputDims.
    pub fn new(height: u32, width: u32, channels: u32) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

impl Default for InputDims {
    fn default() -> Self {
        // Geometry of the deployed screening classifier.
        Self::new(224, 224, 3)
    }
}

/// Configuration consumed by the screening pipeline.
///
/// The embedding application builds this once at startup (typically from
/// a configuration file via serde) and passes it to
/// [`ScreeningPipeline`](crate::pipeline::ScreeningPipeline) construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the ONNX model artifact, loaded once at startup.
    pub model_path: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: usize,
    /// Lower-case file extensions accepted at intake.
    pub allowed_formats: BTreeSet<String>,
    /// Fixed input tensor geometry.
    pub input_dims: InputDims,
    /// Channel layout of the input tensor.
    pub channel_order: ChannelOrder,
    /// RGB color used to pad the letterboxed canvas.
    pub pad_color: [u8; 3],
    /// Number of pooled inference sessions for concurrent requests.
    pub session_pool_size: usize,
    /// Name of the model input tensor; auto-detected when None.
    pub input_name: Option<String>,
    /// Name of the model output tensor; the first session output when None.
    pub output_name: Option<String>,
    /// Directory for archival copies of submitted images; None disables
    /// image persistence.
    pub upload_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/screening.onnx"),
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_formats: default_allowed_formats(),
            input_dims: InputDims::default(),
            channel_order: ChannelOrder::HWC,
            pad_color: [255, 255, 255],
            session_pool_size: 1,
            input_name: None,
            output_name: None,
            upload_dir: None,
        }
    }
}

/// The default intake allow-list: common raster formats the decoder
/// understands.
fn default_allowed_formats() -> BTreeSet<String> {
    ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl PipelineConfig {
    /// Creates a configuration for the given model path with defaults for
    /// everything else.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Checks the logical consistency of the options; the existence of the
    /// model artifact is checked when the inference engine loads it.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a `ScreenError::Config` describing
    /// the first inconsistency found.
    pub fn validate(&self) -> ScreenResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ScreenError::config("max_upload_bytes must be greater than 0"));
        }
        if self.allowed_formats.is_empty() {
            return Err(ScreenError::config("allowed_formats must not be empty"));
        }
        if let Some(ext) = self
            .allowed_formats
            .iter()
            .find(|e| e.is_empty() || *e != &e.to_lowercase())
        {
            return Err(ScreenError::config(format!(
                "allowed format {ext:?} must be a non-empty lower-case extension"
            )));
        }
        if self.input_dims.height == 0 || self.input_dims.width == 0 {
            return Err(ScreenError::config(
                "input dimensions must be greater than 0",
            ));
        }
        if self.input_dims.channels != 3 {
            return Err(ScreenError::config(format!(
                "input channels must be 3 for RGB, got {}",
                self.input_dims.channels
            )));
        }
        if self.session_pool_size == 0 {
            return Err(ScreenError::config(
                "session_pool_size must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Returns true when the extension is in the allow-list.
    ///
    /// The comparison is case-insensitive; the allow-list is stored
    /// lower-case.
    pub fn is_allowed_format(&self, extension: &str) -> bool {
        self.allowed_formats.contains(&extension.to_lowercase())
    }
}
