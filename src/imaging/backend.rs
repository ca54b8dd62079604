//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the normalizer
//! needs: sniff, decode, resize, and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests substitute a recording mock to prove which stages ran.

use super::format::ImageKind;
use super::params::{DecodeLimits, EncodeParams, ResizeParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("unrecognized image container {0}; supported formats are PNG, JPEG, GIF and WebP")]
    UnsupportedContainer(String),
    #[error("Unsupported image format: {extension:?}")]
    UnsupportedFormat { extension: String },
    #[error("failed to decode {format} data: {reason}")]
    Decode { format: ImageKind, reason: String },
    #[error("image exceeds the decode limit of {limit}px per side: {reason}")]
    DimensionLimit { limit: u32, reason: String },
    #[error("decoding would allocate more than the {limit}-byte decode limit: {reason}")]
    MemoryLimit { limit: u64, reason: String },
    #[error("failed to re-encode as {format}: {reason}")]
    Encode { format: ImageKind, reason: String },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// A decoded pixel buffer tagged with the format it was decoded from.
///
/// Never leaves the normalizer: it is consumed by resize and borrowed by encode.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub format: ImageKind,
    pub pixels: DynamicImage,
}

impl DecodedImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }
}

/// Re-encoded bytes, ready for the data URI encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageKind,
    pub dimensions: Dimensions,
    pub bytes: Vec<u8>,
}

/// Trait for image processing backends.
///
/// `sniff` inspects magic bytes only. It returns `Ok(None)` when no known
/// container signature matches and an error when a container is recognized
/// but is not one of the four accepted formats.
pub trait ImageBackend: Sync {
    /// Identify the container from its leading bytes.
    fn sniff(&self, bytes: &[u8]) -> Result<Option<ImageKind>, BackendError>;

    /// Decode `bytes` as `format` within `limits`.
    fn decode(
        &self,
        bytes: &[u8],
        format: ImageKind,
        limits: &DecodeLimits,
    ) -> Result<DecodedImage, BackendError>;

    /// Resample to exactly the requested dimensions.
    fn resize(&self, image: DecodedImage, params: &ResizeParams) -> DecodedImage;

    /// Encode in the image's own format.
    fn encode(
        &self,
        image: &DecodedImage,
        params: &EncodeParams,
    ) -> Result<EncodedImage, BackendError>;
}
