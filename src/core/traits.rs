//! Trait seam between the pipeline and the inference runtime.
//!
//! The pipeline only needs a forward pass over a normalized tensor; this
//! trait keeps the ONNX-backed engine substitutable so the orchestration
//! can be exercised with a fixed-output backend in tests.

use crate::core::errors::ScreenResult;
use crate::core::Tensor4D;

/// A loaded classifier supporting concurrent read-only forward passes.
///
/// Implementations are constructed once at process start and shared
/// across requests; `forward` must not mutate observable state, so
/// repeated calls with the same input and artifact yield identical
/// output.
pub trait InferenceBackend: Send + Sync + std::fmt::Debug {
    /// Runs a forward pass over a single-image batch tensor and returns
    /// the flat model output.
    ///
    /// # Arguments
    ///
    /// * `input` - The normalized `(1, ...)` input tensor.
    ///
    /// # Returns
    ///
    /// The raw output values for the one batch item, or a
    /// `ScreenError::Inference` describing the failure. Implementations
    /// never substitute a default result for a failed pass.
    fn forward(&self, input: &Tensor4D) -> ScreenResult<Vec<f32>>;

    /// The model name used in logs and error context.
    fn model_name(&self) -> &str;
}
