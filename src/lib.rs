//! # Bright Screen
//!
//! The image-intake-and-inference pipeline behind a facial-photo
//! screening service: uploads are validated, decoded, letterboxed to the
//! classifier's fixed geometry, scored by a pre-trained ONNX model, and
//! shaped into a per-class probability report, with every completed
//! prediction appended to an archive collaborator for later review.
//!
//! ## Components
//!
//! - **Intake**: allow-listed formats, a configurable size ceiling, and
//!   filename sanitization before any byte is interpreted
//! - **Normalizer**: aspect-preserving letterbox to the model geometry
//!   and `[0, 1]` pixel scaling into the input tensor
//! - **Inference engine**: a pool of ONNX Runtime sessions loaded once
//!   at startup and shared read-only across concurrent requests
//! - **Result shaping**: validated two-class predictions and
//!   display-ready percentage reports
//! - **Archive seam**: one append event per completed prediction;
//!   archive failure degrades the outcome, never the response
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, the inference engine, and the
//!   backend trait seam
//! * [`domain`] - Class labels, validated predictions, reports
//! * [`intake`] - Upload validation
//! * [`processors`] - Letterbox resize and tensor normalization
//! * [`archive`] - Prediction records, archiver implementations, and the
//!   archival image store
//! * [`pipeline`] - End-to-end orchestration
//! * [`utils`] - Image decoding helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bright_screen::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new("models/screening.onnx");
//! let archiver = Arc::new(JsonlArchiver::new("archive/predictions.jsonl"));
//! let pipeline = ScreeningPipeline::from_config(config, archiver)?;
//!
//! let bytes = std::fs::read("face.jpg")?;
//! let outcome = pipeline.screen(&bytes, "face.jpg", "researcher1")?;
//! println!(
//!     "{}: {}",
//!     outcome.report.class, outcome.report.confidence_percentage
//! );
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod core;
pub mod domain;
pub mod intake;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::archive::{
        Archiver, ImageStore, JsonlArchiver, MemoryArchiver, PredictionRecord,
    };
    pub use crate::core::{
        ChannelOrder, InferenceBackend, InputDims, ModelInfo, OrtClassifier, PipelineConfig,
        ScreenError, ScreenResult,
    };
    pub use crate::domain::{ClassLabel, Prediction, ScreeningReport};
    pub use crate::pipeline::{ScreeningOutcome, ScreeningPipeline};
    pub use crate::utils::decode_image;
}
