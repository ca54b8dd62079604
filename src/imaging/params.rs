//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides whether and how far to resize) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ResizeFilter`] — Resampling filter, Lanczos3 unless configured otherwise.
//! - [`WidthBounds`] — The inclusive `[min, max]` pixel-width window images are normalized into.
//! - [`ResizeParams`] — Target dimensions plus filter for one resize.
//! - [`EncodeParams`] — Encoder settings for the re-encode step.
//! - [`DecodeLimits`] — Per-side pixel cap and allocation ceiling for the decoder.
//! - [`NormalizeSettings`] — Everything the normalizer needs, bundled.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Narrowest width an image is returned at.
pub const MIN_WIDTH: u32 = 20;
/// Widest width an image is returned at.
pub const MAX_WIDTH: u32 = 800;
/// JPEG re-encode quality.
pub const JPEG_QUALITY: u32 = 85;
/// Resampling filter used in both directions.
pub const RESIZE_FILTER: ResizeFilter = ResizeFilter::Lanczos3;
/// Decoder cap on either pixel dimension.
pub const MAX_DECODE_DIMENSION: u32 = 16_384;
/// Decoder allocation ceiling in bytes. Fits a `MAX_DECODE_DIMENSION`-square RGBA8 image.
pub const MAX_DECODE_ALLOC: u64 = 1024 * 1024 * 1024;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(JPEG_QUALITY)
    }
}

/// Resampling filter, named the way it appears in `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Inclusive pixel-width window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthBounds {
    pub min: u32,
    pub max: u32,
}

impl Default for WidthBounds {
    fn default() -> Self {
        Self {
            min: MIN_WIDTH,
            max: MAX_WIDTH,
        }
    }
}

/// Parameters for a single resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub filter: ResizeFilter,
}

/// Parameters for the re-encode step. Quality only affects JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    pub quality: Quality,
}

/// Resource caps applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted width or height, in pixels.
    pub max_dimension: u32,
    /// Largest buffer the decoder may allocate, in bytes.
    pub max_alloc: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DECODE_DIMENSION,
            max_alloc: MAX_DECODE_ALLOC,
        }
    }
}

/// Settings consumed by [`normalize`](super::operations::normalize).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeSettings {
    pub bounds: WidthBounds,
    pub filter: ResizeFilter,
    pub jpeg_quality: Quality,
    pub decode: DecodeLimits,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            bounds: WidthBounds::default(),
            filter: RESIZE_FILTER,
            jpeg_quality: Quality::default(),
            decode: DecodeLimits::default(),
        }
    }
}
