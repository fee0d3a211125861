//! Upload intake validation.
//!
//! Everything here runs before any byte of the payload is interpreted:
//! the declared filename is sanitized, its extension checked against the
//! configured allow-list, and the payload size checked against the
//! configured ceiling. Only payloads that pass all three reach the
//! decoder.

use crate::core::config::PipelineConfig;
use crate::core::errors::{ScreenError, ScreenResult};

/// Characters stripped from client-declared filenames before the name is
/// used anywhere.
const DANGEROUS_CHARS: [char; 9] = ['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Strips path traversal sequences and dangerous characters from a
/// client-declared filename.
///
/// The result is safe to embed in stored names and log lines; it is never
/// used to locate the upload itself.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = filename.replace("..", "");
    sanitized.retain(|c| !DANGEROUS_CHARS.contains(&c) && c != '\0');
    sanitized.trim().to_string()
}

/// Extracts the lower-cased extension from a filename.
///
/// Returns None when the name has no `.` or ends with one.
pub fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Checks the declared filename against the configured allow-list.
///
/// # Arguments
///
/// * `config` - The pipeline configuration carrying the allow-list.
/// * `filename` - The sanitized filename.
///
/// # Returns
///
/// The lower-cased extension, or `ScreenError::UnsupportedFormat` when
/// the extension is missing or not allow-listed.
pub fn require_allowed_format(config: &PipelineConfig, filename: &str) -> ScreenResult<String> {
    let ext = extension(filename).ok_or_else(|| {
        ScreenError::unsupported_format("", &config.allowed_formats)
    })?;
    if !config.is_allowed_format(&ext) {
        return Err(ScreenError::unsupported_format(ext, &config.allowed_formats));
    }
    Ok(ext)
}

/// Checks the payload size against the configured ceiling.
///
/// Runs on the byte count alone; the payload is not decoded or copied.
pub fn check_size(config: &PipelineConfig, payload_len: usize) -> ScreenResult<()> {
    if payload_len > config.max_upload_bytes {
        return Err(ScreenError::PayloadTooLarge {
            actual: payload_len,
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}
