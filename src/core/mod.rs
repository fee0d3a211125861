//! Core types for the screening pipeline: errors, configuration, the
//! inference engine, and the backend trait seam.

pub mod config;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{ChannelOrder, InputDims, PipelineConfig};
pub use errors::{ScreenError, ScreenResult, SimpleError};
pub use inference::{ModelInfo, OrtClassifier};
pub use traits::InferenceBackend;

/// A 4D `f32` tensor in the shape the model consumes.
pub type Tensor4D = ndarray::Array4<f32>;

/// Initializes tracing with an environment-driven filter.
///
/// Call once at process start; typically from the embedding
/// application's main function.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
