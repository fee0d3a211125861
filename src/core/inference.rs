//! ONNX Runtime inference engine for the screening pipeline.
//!
//! This module wraps the single pre-loaded classifier behind a pool of
//! ONNX Runtime sessions. The pool is built once at startup, treated as
//! immutable afterwards, and shared across concurrent requests; each
//! forward pass locks one pooled session chosen round-robin, so the
//! runtime is never invoked concurrently on one session instance.

use crate::core::config::PipelineConfig;
use crate::core::errors::{ScreenError, ScreenResult, SimpleError};
use crate::core::traits::InferenceBackend;
use crate::core::Tensor4D;
use ort::session::Session;
use ort::value::TensorRef;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Input tensor names commonly produced by model exporters, tried in
/// order when the configuration does not pin one.
const COMMON_INPUT_NAMES: [&str; 5] = ["input", "x", "images", "data", "image"];

/// Diagnostic description of a loaded model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// The model name derived from the artifact file stem.
    pub model_name: String,
    /// The artifact path the sessions were built from.
    pub model_path: PathBuf,
    /// The resolved input tensor name.
    pub input_name: String,
    /// The resolved output tensor name.
    pub output_name: String,
    /// Number of pooled sessions.
    pub pool_size: usize,
}

/// A classifier loaded from an ONNX artifact.
///
/// Loading happens once, at construction; any failure there is a
/// [`ScreenError::ModelLoad`] and the surrounding application treats it
/// as fatal to startup. After construction the engine is read-only:
/// [`forward`](InferenceBackend::forward) takes `&self` and is safe to
/// call from any number of threads.
#[derive(Debug)]
pub struct OrtClassifier {
    /// Pool of ONNX Runtime sessions for concurrent predictions.
    sessions: Vec<Mutex<Session>>,
    /// Next index for round-robin session selection.
    next_idx: AtomicUsize,
    /// The name of the input tensor.
    input_name: String,
    /// The name of the output tensor.
    output_name: String,
    /// The path to the model file for error context.
    model_path: PathBuf,
    /// The model name for error context.
    model_name: String,
}

impl OrtClassifier {
    /// Loads the classifier described by the configuration.
    ///
    /// Builds `session_pool_size` sessions from the artifact at
    /// `model_path` and resolves the input/output tensor names, either
    /// from the configuration or by inspecting the first session.
    ///
    /// # Arguments
    ///
    /// * `config` - The pipeline configuration naming the artifact and
    ///   session settings.
    ///
    /// # Returns
    ///
    /// A Result containing the loaded engine or a `ScreenError::ModelLoad`.
    pub fn load(config: &PipelineConfig) -> ScreenResult<Self> {
        let path = config.model_path.as_path();
        if !path.is_file() {
            return Err(ScreenError::model_load(
                path,
                "model artifact not found",
                SimpleError::new("no such file"),
            ));
        }

        let pool_size = config.session_pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);

        // The first session resolves the tensor names for the whole pool.
        let first_session = Self::build_session(path)?;
        let input_name = match &config.input_name {
            Some(name) => name.clone(),
            None => Self::detect_input_name(&first_session),
        };
        let output_name = match &config.output_name {
            Some(name) => name.clone(),
            None => first_session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| {
                    ScreenError::model_load(
                        path,
                        "model declares no outputs",
                        SimpleError::new("empty output list"),
                    )
                })?,
        };
        sessions.push(Mutex::new(first_session));

        for _ in 1..pool_size {
            sessions.push(Mutex::new(Self::build_session(path)?));
        }

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        info!(
            model = %model_name,
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            pool = pool_size,
            "model loaded"
        );

        Ok(Self {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Builds one ONNX Runtime session from the artifact.
    fn build_session(path: &Path) -> ScreenResult<Session> {
        Session::builder()
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| {
                ScreenError::model_load(
                    path,
                    "failed to create ONNX session",
                    e,
                )
            })
    }

    /// Picks the input tensor name from the session.
    ///
    /// Prefers a name from the common exporter vocabulary; falls back to
    /// the first declared input.
    fn detect_input_name(session: &Session) -> String {
        let available: Vec<String> = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        COMMON_INPUT_NAMES
            .iter()
            .find(|&&name| available.iter().any(|input| input == name))
            .map(|s| s.to_string())
            .or_else(|| available.first().cloned())
            .unwrap_or_else(|| "input".to_string())
    }

    /// Diagnostic description of the loaded model.
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: self.model_name.clone(),
            model_path: self.model_path.clone(),
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            pool_size: self.sessions.len(),
        }
    }
}

impl InferenceBackend for OrtClassifier {
    /// Runs a forward pass over the input tensor.
    ///
    /// A pooled session is selected round-robin and locked for the
    /// duration of the pass; concurrent callers proceed independently on
    /// the other pool members.
    fn forward(&self, input: &Tensor4D) -> ScreenResult<Vec<f32>> {
        let input_shape = input.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(input.view()).map_err(|e| {
            ScreenError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        // Round-robin select a session.
        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            ScreenError::inference_msg(
                &self.model_name,
                format!(
                    "failed to acquire session lock {}/{}",
                    idx,
                    self.sessions.len()
                ),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            ScreenError::inference(
                &self.model_name,
                format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ScreenError::inference(
                    &self.model_name,
                    format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        debug!(
            model = %self.model_name,
            session = idx,
            output_shape = ?output_shape,
            "forward pass complete"
        );

        Ok(output_data.to_vec())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
