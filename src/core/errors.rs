//! Error types for the screening pipeline.
//!
//! This module defines the error taxonomy for the pipeline: intake
//! validation failures (unsupported format, oversized payload, corrupt
//! image), model loading and inference failures, configuration errors,
//! and archive write failures. It also provides utility functions for
//! creating these errors with appropriate context.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Enum representing the errors that can occur in the screening pipeline.
///
/// Intake failures (`UnsupportedFormat`, `PayloadTooLarge`, `CorruptImage`)
/// and `Inference` are recoverable per request: the caller is told to
/// resubmit or retry while the process keeps serving. `ModelLoad` only
/// occurs while constructing the engine and is fatal to startup.
/// `Archive` is non-fatal and never fails an already computed response.
#[derive(Error, Debug)]
pub enum ScreenError {
    /// The declared file extension is outside the configured allow-list.
    #[error("unsupported image format: {extension:?} (supported: {supported})")]
    UnsupportedFormat {
        /// The extension extracted from the declared filename.
        extension: String,
        /// Comma-separated list of accepted extensions.
        supported: String,
    },

    /// The payload exceeds the configured maximum upload size.
    #[error("payload of {actual} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// The size of the submitted payload in bytes.
        actual: usize,
        /// The configured ceiling in bytes.
        limit: usize,
    },

    /// The payload could not be decoded as an image.
    #[error("corrupt image: {context}")]
    CorruptImage {
        /// Additional context about the decode failure.
        context: String,
        /// The underlying decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The model artifact could not be loaded into an inference session.
    #[error("failed to load model from {path}: {context}")]
    ModelLoad {
        /// The configured model artifact path.
        path: PathBuf,
        /// Additional context about the load failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The forward pass or output extraction failed.
    #[error("inference failed for model {model}: {context}")]
    Inference {
        /// The model name for error context.
        model: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    Config {
        /// A message describing the configuration error.
        message: String,
    },

    /// The archive collaborator rejected the append event.
    #[error("archive write failed: {context}")]
    Archive {
        /// Additional context about the archive failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    /// Creates a ScreenError for an extension outside the allow-list.
    ///
    /// # Arguments
    ///
    /// * `extension` - The rejected extension.
    /// * `allowed` - The configured allow-list, for the error message.
    pub fn unsupported_format<I, S>(extension: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let supported = allowed
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::UnsupportedFormat {
            extension: extension.into(),
            supported,
        }
    }

    /// Creates a ScreenError for a decode failure.
    pub fn corrupt_image(context: impl Into<String>, source: image::ImageError) -> Self {
        Self::CorruptImage {
            context: context.into(),
            source,
        }
    }

    /// Creates a ScreenError for a model loading failure.
    ///
    /// # Arguments
    ///
    /// * `path` - The model artifact path.
    /// * `context` - Additional context about the failure.
    /// * `source` - The underlying error that caused this error.
    pub fn model_load(
        path: &Path,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelLoad {
            path: path.to_path_buf(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a ScreenError for an inference failure.
    ///
    /// # Arguments
    ///
    /// * `model` - The model name for error context.
    /// * `context` - Additional context about the failure.
    /// * `source` - The underlying error that caused this error.
    pub fn inference(
        model: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an inference error from a message alone.
    pub fn inference_msg(model: impl Into<String>, context: impl Into<String>) -> Self {
        let context = context.into();
        Self::Inference {
            model: model.into(),
            context: context.clone(),
            source: Box::new(SimpleError::new(context)),
        }
    }

    /// Creates a ScreenError for a configuration problem.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a ScreenError for an archive write failure.
    pub fn archive(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Archive {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for failures that leave the process able to serve
    /// further requests.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ModelLoad { .. } | Self::Config { .. })
    }

    /// A short message suitable for rendering to the submitting user.
    ///
    /// Every recoverable failure maps to a specific instruction; internal
    /// details stay in the error chain and the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat { supported, .. } => {
                format!("Unsupported file format. Supported formats: {supported}.")
            }
            Self::PayloadTooLarge { actual, limit } => format!(
                "File is too large ({:.2} MB). Maximum size is {:.0} MB.",
                *actual as f64 / (1024.0 * 1024.0),
                *limit as f64 / (1024.0 * 1024.0),
            ),
            Self::CorruptImage { .. } => {
                "The file could not be read as an image. Please upload a valid photo.".to_string()
            }
            Self::Inference { .. } => "Could not analyze the image. Please try again.".to_string(),
            _ => "An internal error occurred. Please try again.".to_string(),
        }
    }
}

/// A simple error type that carries only a message.
///
/// Used where an error source is required but only a descriptive string
/// is available.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        let err = ScreenError::PayloadTooLarge {
            actual: 12 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        assert!(err.is_recoverable());

        let err = ScreenError::config("bad dims");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn user_message_names_the_limit() {
        let err = ScreenError::PayloadTooLarge {
            actual: 12 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        let msg = err.user_message();
        assert!(msg.contains("12.00 MB"));
        assert!(msg.contains("10 MB"));
    }

    #[test]
    fn unsupported_format_lists_allowed() {
        let err = ScreenError::unsupported_format("exe", ["jpg", "png"]);
        assert!(err.to_string().contains("jpg, png"));
    }
}
