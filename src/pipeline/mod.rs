//! End-to-end screening pipeline.
//!
//! One pipeline invocation per inbound request: intake checks, decode,
//! letterbox and normalize, forward pass, output decode, archival. The
//! computation is straight-line and synchronous; the host's request
//! concurrency model decides how many invocations run at once, and the
//! only shared resource is the read-only inference backend.
//!
//! The pipeline is constructed explicitly at process start and injected
//! where requests are handled; there is no module-level instance. A
//! model loading failure at construction is fatal to startup. At request
//! time every failure is a discriminated [`ScreenError`] the embedding
//! application can translate into a uniform user-facing message.

use crate::archive::{Archiver, ImageStore, PredictionRecord};
use crate::core::config::PipelineConfig;
use crate::core::errors::ScreenResult;
use crate::core::inference::OrtClassifier;
use crate::core::traits::InferenceBackend;
use crate::domain::prediction::Prediction;
use crate::domain::report::ScreeningReport;
use crate::processors::{LetterboxResize, NormalizeImage};
use crate::{intake, utils};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// The result of one completed screening.
#[derive(Debug, Clone)]
pub struct ScreeningOutcome {
    /// The validated prediction.
    pub prediction: Prediction,
    /// The display-ready report.
    pub report: ScreeningReport,
    /// Path of the archival image copy, when one was written.
    pub stored_image: Option<PathBuf>,
    /// False when the archive event could not be recorded. The prediction
    /// itself is unaffected; the condition is degraded, not failed.
    pub archived: bool,
}

/// The image-intake-and-inference pipeline.
///
/// Shared across request handlers behind an `Arc`; all methods take
/// `&self` and the pipeline holds no per-request state.
#[derive(Debug)]
pub struct ScreeningPipeline {
    config: PipelineConfig,
    resize: LetterboxResize,
    normalize: NormalizeImage,
    backend: Arc<dyn InferenceBackend>,
    archiver: Arc<dyn Archiver>,
    store: Option<ImageStore>,
}

impl ScreeningPipeline {
    /// Builds a pipeline around an already constructed backend.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated pipeline options.
    /// * `backend` - The loaded classifier.
    /// * `archiver` - The archive collaborator receiving append events.
    ///
    /// # Returns
    ///
    /// A Result containing the pipeline or a `ScreenError::Config` when
    /// the configuration is inconsistent.
    pub fn new(
        config: PipelineConfig,
        backend: Arc<dyn InferenceBackend>,
        archiver: Arc<dyn Archiver>,
    ) -> ScreenResult<Self> {
        config.validate()?;
        let resize = LetterboxResize::new(
            config.input_dims.width,
            config.input_dims.height,
            config.pad_color,
        )?;
        let normalize = NormalizeImage::new(None, config.channel_order)?;
        let store = config.upload_dir.clone().map(ImageStore::new);

        Ok(Self {
            config,
            resize,
            normalize,
            backend,
            archiver,
            store,
        })
    }

    /// Builds a pipeline by loading the ONNX classifier named in the
    /// configuration.
    ///
    /// This is the startup path: a `ScreenError::ModelLoad` here means
    /// the service has no function and the process should not come up.
    pub fn from_config(
        config: PipelineConfig,
        archiver: Arc<dyn Archiver>,
    ) -> ScreenResult<Self> {
        config.validate()?;
        let backend = OrtClassifier::load(&config)?;
        Self::new(config, Arc::new(backend), archiver)
    }

    /// The configuration the pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Screens one uploaded image.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw upload payload.
    /// * `declared_filename` - The client-declared filename; only its
    ///   sanitized form and extension are used.
    /// * `user` - The requesting user identity, recorded with the result.
    ///
    /// # Returns
    ///
    /// A `ScreeningOutcome` on success. Intake and inference failures
    /// return the matching `ScreenError` variant; no archive event is
    /// emitted for a failed request.
    pub fn screen(
        &self,
        bytes: &[u8],
        declared_filename: &str,
        user: &str,
    ) -> ScreenResult<ScreeningOutcome> {
        let original_filename = intake::sanitize_filename(declared_filename);
        let ext = intake::require_allowed_format(&self.config, &original_filename)?;
        intake::check_size(&self.config, bytes.len())?;

        let img = utils::decode_image(bytes)?;
        let letterboxed = self.resize.apply(&img);
        let tensor = self.normalize.to_tensor(&letterboxed);

        let output = self.backend.forward(&tensor)?;
        let prediction = Prediction::from_model_output(self.backend.model_name(), &output)?;
        let report = ScreeningReport::from_prediction(&prediction);

        let recorded_at = Utc::now();
        let stored_image = self.store.as_ref().and_then(|store| {
            match store.save(&img, prediction.label(), recorded_at, user, &ext) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(user, error = %e, "failed to persist archival image copy");
                    None
                }
            }
        });

        let record = PredictionRecord {
            user: user.to_string(),
            recorded_at,
            stored_image: stored_image
                .as_ref()
                .map(|p| p.display().to_string()),
            original_filename,
            label: prediction.label(),
            confidence: prediction.confidence(),
        };
        let archived = match self.archiver.record(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!(user, error = %e, "archive write failed; response unaffected");
                false
            }
        };

        info!(
            user,
            class = %prediction.label(),
            confidence = prediction.confidence(),
            archived,
            "screening complete"
        );

        Ok(ScreeningOutcome {
            prediction,
            report,
            stored_image,
            archived,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchiver;
    use crate::core::errors::{ScreenError, ScreenResult};
    use crate::core::Tensor4D;
    use crate::domain::label::ClassLabel;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a fixed output, counting invocations.
    #[derive(Debug)]
    struct FixedBackend {
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(output: Vec<f32>) -> Self {
            Self {
                output,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl InferenceBackend for FixedBackend {
        fn forward(&self, _input: &Tensor4D) -> ScreenResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    /// Backend whose output is the mean of the input tensor, making
    /// cross-request contamination observable.
    #[derive(Debug)]
    struct EchoBackend;

    impl InferenceBackend for EchoBackend {
        fn forward(&self, input: &Tensor4D) -> ScreenResult<Vec<f32>> {
            // Accumulate in f64 so the mean of a large tensor is not biased
            // by f32 summation rounding (150k elements lose ~0.1% otherwise).
            let mean = input.iter().map(|v| *v as f64).sum::<f64>() / input.len() as f64;
            Ok(vec![mean as f32])
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[derive(Debug)]
    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn record(&self, _record: &PredictionRecord) -> ScreenResult<()> {
            Err(ScreenError::archive(
                "archive is down",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }
    }

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn pipeline_with(
        backend: Arc<dyn InferenceBackend>,
        archiver: Arc<dyn Archiver>,
    ) -> ScreeningPipeline {
        ScreeningPipeline::new(PipelineConfig::default(), backend, archiver).unwrap()
    }

    #[test]
    fn disallowed_extension_never_reaches_inference() {
        let backend = Arc::new(FixedBackend::new(vec![0.9]));
        let archiver = Arc::new(MemoryArchiver::new());
        let pipeline = pipeline_with(backend.clone(), archiver.clone());

        let err = pipeline
            .screen(&png_bytes(64, 64, [0; 3]), "face.exe", "u1")
            .unwrap_err();

        assert!(matches!(err, ScreenError::UnsupportedFormat { .. }));
        assert_eq!(backend.calls(), 0);
        assert!(archiver.is_empty());
    }

    #[test]
    fn oversized_payload_is_rejected_before_decode() {
        let backend = Arc::new(FixedBackend::new(vec![0.9]));
        let archiver = Arc::new(MemoryArchiver::new());
        let pipeline = pipeline_with(backend.clone(), archiver.clone());

        // 12 MB of garbage behind a valid-looking name: the size gate
        // fires before any decode attempt would fail.
        let payload = vec![0u8; 12 * 1024 * 1024];
        let err = pipeline.screen(&payload, "huge.jpg", "u1").unwrap_err();

        assert!(matches!(
            err,
            ScreenError::PayloadTooLarge {
                actual,
                limit,
            } if actual == 12 * 1024 * 1024 && limit == 10 * 1024 * 1024
        ));
        assert_eq!(backend.calls(), 0);
        assert!(archiver.is_empty());
    }

    #[test]
    fn text_behind_jpg_name_is_corrupt_after_passing_the_extension_check() {
        let backend = Arc::new(FixedBackend::new(vec![0.9]));
        let archiver = Arc::new(MemoryArchiver::new());
        let pipeline = pipeline_with(backend.clone(), archiver.clone());

        let err = pipeline
            .screen(b"just some text", "notes.jpg", "u1")
            .unwrap_err();

        assert!(matches!(err, ScreenError::CorruptImage { .. }));
        assert_eq!(backend.calls(), 0);
        assert!(archiver.is_empty());
    }

    #[test]
    fn valid_photo_yields_report_and_one_archive_event() {
        let backend = Arc::new(FixedBackend::new(vec![0.9735]));
        let archiver = Arc::new(MemoryArchiver::new());
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            upload_dir: Some(dir.path().join("uploads")),
            ..PipelineConfig::default()
        };
        let pipeline =
            ScreeningPipeline::new(config, backend.clone(), archiver.clone()).unwrap();

        let outcome = pipeline
            .screen(&png_bytes(500, 500, [180, 150, 140]), "face.png", "researcher1")
            .unwrap();

        assert_eq!(outcome.prediction.label(), ClassLabel::Normal);
        assert_eq!(outcome.report.probabilities.len(), 2);
        let sum: f32 = outcome.prediction.probabilities().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(outcome.archived);

        let stored = outcome.stored_image.expect("archival copy written");
        assert!(stored.exists());

        let records = archiver.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user, "researcher1");
        assert_eq!(records[0].label, outcome.prediction.label());
        assert_eq!(records[0].confidence, outcome.prediction.confidence());
        assert_eq!(records[0].original_filename, "face.png");
        assert_eq!(
            records[0].stored_image.as_deref(),
            Some(stored.display().to_string().as_str())
        );
    }

    #[test]
    fn archive_failure_degrades_but_does_not_fail_the_response() {
        let backend = Arc::new(FixedBackend::new(vec![0.2]));
        let pipeline = pipeline_with(backend, Arc::new(FailingArchiver));

        let outcome = pipeline
            .screen(&png_bytes(64, 64, [10, 10, 10]), "face.jpg", "u1")
            .unwrap();

        assert!(!outcome.archived);
        assert_eq!(outcome.prediction.label(), ClassLabel::DownSyndrome);
    }

    #[test]
    fn varying_source_dimensions_all_normalize_to_the_configured_shape() {
        // EchoBackend sees the tensor the normalizer produced; a uniform
        // gray input must survive letterboxing untouched when square.
        let pipeline = pipeline_with(Arc::new(EchoBackend), Arc::new(MemoryArchiver::new()));

        for (w, h) in [(224, 224), (500, 500), (1000, 1000)] {
            let gray = 200u8;
            let outcome = pipeline
                .screen(&png_bytes(w, h, [gray; 3]), "face.png", "u1")
                .unwrap();
            let expected = gray as f32 / 255.0;
            assert!(
                (outcome.prediction.probability_of(ClassLabel::Normal) - expected).abs() < 1e-3,
                "dimensions {w}x{h}"
            );
        }
    }

    #[test]
    fn concurrent_requests_do_not_contaminate_each_other() {
        let pipeline = Arc::new(pipeline_with(
            Arc::new(EchoBackend),
            Arc::new(MemoryArchiver::new()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = Arc::clone(&pipeline);
                std::thread::spawn(move || {
                    let gray = 140 + (i as u8) * 10;
                    let outcome = pipeline
                        .screen(&png_bytes(224, 224, [gray; 3]), "face.png", "u1")
                        .unwrap();
                    (gray, outcome)
                })
            })
            .collect();

        for handle in handles {
            let (gray, outcome) = handle.join().unwrap();
            let expected = gray as f32 / 255.0;
            assert!(
                (outcome.prediction.probability_of(ClassLabel::Normal) - expected).abs() < 1e-3,
                "request with gray {gray} got {}",
                outcome.prediction.probability_of(ClassLabel::Normal)
            );
        }
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = PipelineConfig {
            session_pool_size: 0,
            ..PipelineConfig::default()
        };
        let result = ScreeningPipeline::new(
            config,
            Arc::new(EchoBackend),
            Arc::new(MemoryArchiver::new()),
        );
        assert!(matches!(result, Err(ScreenError::Config { .. })));
    }
}
