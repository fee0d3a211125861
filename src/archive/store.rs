//! Archival persistence of submitted images.
//!
//! A successful prediction keeps a re-encoded copy of the decoded image
//! under the configured upload directory, named
//! `{Class}_{YYYYMMDD_HHMMSS}_{user}.{ext}` so records can be reviewed
//! against the photos that produced them. JPEG uploads stay JPEG;
//! everything else is stored as PNG.

use crate::core::errors::{ScreenError, ScreenResult};
use crate::domain::label::ClassLabel;
use crate::intake;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

/// Writes archival image copies under one directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created on first write, not here, so constructing
    /// a pipeline never touches the filesystem.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory archival copies are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists one archival copy.
    ///
    /// # Arguments
    ///
    /// * `img` - The decoded upload, before letterboxing.
    /// * `label` - The predicted class, embedded in the stored name.
    /// * `at` - The prediction timestamp, embedded in the stored name.
    /// * `user` - The requesting user identity, embedded in the stored name.
    /// * `original_ext` - The upload's extension, deciding the stored format.
    ///
    /// # Returns
    ///
    /// The path of the written file, or a `ScreenError::Io` when the
    /// directory or file cannot be written. The caller treats failure as
    /// non-fatal.
    pub fn save(
        &self,
        img: &RgbImage,
        label: ClassLabel,
        at: DateTime<Utc>,
        user: &str,
        original_ext: &str,
    ) -> ScreenResult<PathBuf> {
        let (format, stored_ext) = storage_format(original_ext);
        let filename = archival_filename(label, at, user, stored_ext);
        let path = self.dir.join(filename);

        std::fs::create_dir_all(&self.dir)?;
        img.save_with_format(&path, format).map_err(|e| match e {
            image::ImageError::IoError(io) => ScreenError::Io(io),
            other => ScreenError::archive("failed to encode archival copy", other),
        })?;
        Ok(path)
    }
}

/// Maps an upload extension to the stored encoding.
fn storage_format(original_ext: &str) -> (ImageFormat, &'static str) {
    match original_ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => (ImageFormat::Jpeg, "jpg"),
        _ => (ImageFormat::Png, "png"),
    }
}

/// Builds the archival filename `{Class}_{YYYYMMDD_HHMMSS}_{user}.{ext}`.
///
/// The user identity goes through the same sanitization as declared
/// filenames, with spaces collapsed to underscores.
pub fn archival_filename(
    label: ClassLabel,
    at: DateTime<Utc>,
    user: &str,
    ext: &str,
) -> String {
    let user = intake::sanitize_filename(user).replace(' ', "_");
    format!(
        "{}_{}_{}.{}",
        label.archival_tag(),
        at.format("%Y%m%d_%H%M%S"),
        user,
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::Rgb;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn filename_follows_the_archival_scheme() {
        let name = archival_filename(ClassLabel::DownSyndrome, at(), "researcher1", "jpg");
        assert_eq!(name, "DownSyndrome_20260314_092653_researcher1.jpg");
    }

    #[test]
    fn filename_sanitizes_the_user() {
        let name = archival_filename(ClassLabel::Normal, at(), "dr. a/b smith", "png");
        assert_eq!(name, "Normal_20260314_092653_dr._ab_smith.png");
    }

    #[test]
    fn jpeg_stays_jpeg_everything_else_becomes_png() {
        assert_eq!(storage_format("JPEG").1, "jpg");
        assert_eq!(storage_format("jpg").1, "jpg");
        assert_eq!(storage_format("webp").1, "png");
        assert_eq!(storage_format("gif").1, "png");
    }

    #[test]
    fn save_writes_a_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));
        let img = RgbImage::from_pixel(32, 32, Rgb([120, 60, 30]));

        let path = store
            .save(&img, ClassLabel::Normal, at(), "researcher1", "png")
            .unwrap();

        assert!(path.ends_with("Normal_20260314_092653_researcher1.png"));
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (32, 32));
        assert_eq!(reloaded.get_pixel(0, 0), &Rgb([120, 60, 30]));
    }
}
