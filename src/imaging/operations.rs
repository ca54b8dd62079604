//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take settings, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, EncodedImage, ImageBackend};
use super::calculations::calculate_normalized_dimensions;
use super::format::{ImageKind, extension_of};
use super::params::{EncodeParams, NormalizeSettings, Quality, ResizeParams};
use std::path::Path;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Output of [`normalize`]: the re-encoded image and the size it started at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub original: Dimensions,
    pub encoded: EncodedImage,
}

impl NormalizedImage {
    pub fn was_resized(&self) -> bool {
        self.original != self.encoded.dimensions
    }
}

/// Determine the format of `bytes`.
///
/// Magic-byte sniffing always wins. Only when no signature matches is the
/// extension of `path` consulted, and then only `jpg`/`jpeg`/`png`/`gif`/`webp`.
pub fn detect_format(backend: &impl ImageBackend, bytes: &[u8], path: &Path) -> Result<ImageKind> {
    if let Some(kind) = backend.sniff(bytes)? {
        return Ok(kind);
    }
    let extension = extension_of(path);
    let kind = ImageKind::from_extension(&extension)
        .ok_or(BackendError::UnsupportedFormat { extension })?;
    debug!(format = %kind, path = %path.display(), "no signature matched, using extension");
    Ok(kind)
}

/// Plan the resize for an image of the given dimensions.
///
/// `None` means the width is already within bounds and the pixels are left alone.
pub fn plan_resize(original: Dimensions, settings: &NormalizeSettings) -> Option<ResizeParams> {
    let (width, height) = calculate_normalized_dimensions(original.as_tuple(), settings.bounds);
    (width != original.width).then_some(ResizeParams {
        width,
        height,
        filter: settings.filter,
    })
}

/// Encoder settings for a format. Quality is only meaningful for JPEG.
pub fn plan_encode(format: ImageKind, settings: &NormalizeSettings) -> EncodeParams {
    match format {
        ImageKind::Jpeg => EncodeParams {
            quality: settings.jpeg_quality,
        },
        _ => EncodeParams {
            quality: Quality::default(),
        },
    }
}

/// Decode, bring the width into bounds, and re-encode in the same format.
///
/// `path` is only used for the extension fallback in [`detect_format`].
pub fn normalize(
    backend: &impl ImageBackend,
    bytes: &[u8],
    path: &Path,
    settings: &NormalizeSettings,
) -> Result<NormalizedImage> {
    let format = detect_format(backend, bytes, path)?;
    let decoded = backend.decode(bytes, format, &settings.decode)?;
    let original = decoded.dimensions();
    debug!(%format, width = original.width, height = original.height, "decoded");

    let image = match plan_resize(original, settings) {
        Some(params) => {
            debug!(width = params.width, height = params.height, "resizing");
            backend.resize(decoded, &params)
        }
        None => decoded,
    };

    let encoded = backend.encode(&image, &plan_encode(format, settings))?;
    Ok(NormalizedImage { original, encoded })
}
