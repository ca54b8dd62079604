//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff | `image::guess_format` (magic bytes only) |
//! | Decode (PNG, JPEG, GIF, WebP) | `image::ImageReader` with `image::Limits` (per-side cap and `max_alloc`) |
//! | Resize | `DynamicImage::resize_exact`, Lanczos3 unless configured otherwise |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → PNG, GIF, WebP | `DynamicImage::write_to` (WebP is lossless) |
//!
//! Animated GIFs decode to their first frame.

use super::backend::{BackendError, DecodedImage, EncodedImage, ImageBackend};
use super::format::ImageKind;
use super::params::{DecodeLimits, EncodeParams, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::error::{LimitError, LimitErrorKind};
use image::{ColorType, DynamicImage, ImageError, ImageReader, Limits};
use std::borrow::Cow;
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_limits(caps: &DecodeLimits) -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(caps.max_dimension);
    limits.max_image_height = Some(caps.max_dimension);
    limits.max_alloc = Some(caps.max_alloc);
    limits
}

/// Name the cap that was hit.
fn limit_error(format: ImageKind, caps: &DecodeLimits, err: LimitError) -> BackendError {
    let reason = err.to_string();
    match err.kind() {
        LimitErrorKind::DimensionError => BackendError::DimensionLimit {
            limit: caps.max_dimension,
            reason,
        },
        LimitErrorKind::InsufficientMemory => BackendError::MemoryLimit {
            limit: caps.max_alloc,
            reason,
        },
        _ => BackendError::Decode { format, reason },
    }
}

/// Convert pixel layouts the target encoder cannot take.
///
/// JPEG has no alpha channel; the GIF and WebP encoders only accept 8-bit
/// RGB(A); PNG cannot store floating point samples.
fn prepare_for_encoding(format: ImageKind, img: &DynamicImage) -> Cow<'_, DynamicImage> {
    let color = img.color();
    match format {
        ImageKind::Jpeg => match color {
            ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(img),
            _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        },
        ImageKind::Gif | ImageKind::WebP => match color {
            ColorType::Rgb8 | ColorType::Rgba8 => Cow::Borrowed(img),
            c if c.has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
            _ => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        },
        ImageKind::Png => match color {
            ColorType::Rgb32F | ColorType::Rgba32F => {
                Cow::Owned(DynamicImage::ImageRgba16(img.to_rgba16()))
            }
            _ => Cow::Borrowed(img),
        },
    }
}

impl ImageBackend for RustBackend {
    fn sniff(&self, bytes: &[u8]) -> Result<Option<ImageKind>, BackendError> {
        match image::guess_format(bytes) {
            Ok(format) => ImageKind::from_image_format(format)
                .map(Some)
                .ok_or_else(|| BackendError::UnsupportedContainer(format!("{format:?}"))),
            Err(_) => Ok(None),
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
        format: ImageKind,
        limits: &DecodeLimits,
    ) -> Result<DecodedImage, BackendError> {
        let mut reader = ImageReader::with_format(Cursor::new(bytes), format.image_format());
        reader.limits(decode_limits(limits));
        let pixels = reader.decode().map_err(|e| match e {
            ImageError::Limits(err) => limit_error(format, limits, err),
            other => BackendError::Decode {
                format,
                reason: other.to_string(),
            },
        })?;
        Ok(DecodedImage { format, pixels })
    }

    fn resize(&self, image: DecodedImage, params: &ResizeParams) -> DecodedImage {
        let pixels =
            image
                .pixels
                .resize_exact(params.width, params.height, params.filter.filter_type());
        DecodedImage {
            format: image.format,
            pixels,
        }
    }

    fn encode(
        &self,
        image: &DecodedImage,
        params: &EncodeParams,
    ) -> Result<EncodedImage, BackendError> {
        let format = image.format;
        let prepared = prepare_for_encoding(format, &image.pixels);
        let mut bytes = Vec::new();

        let result = match format {
            ImageKind::Jpeg => {
                let quality = params.quality.value() as u8;
                prepared.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
            }
            other => prepared.write_to(&mut Cursor::new(&mut bytes), other.image_format()),
        };
        result.map_err(|e| BackendError::Encode {
            format,
            reason: e.to_string(),
        })?;

        Ok(EncodedImage {
            format,
            dimensions: image.dimensions(),
            bytes,
        })
    }
}
