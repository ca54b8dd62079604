//! Image normalization in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Sniff** | `image::guess_format` on the leading bytes |
//! | **Decode** | `image::ImageReader` with dimension limits |
//! | **Resize** | Lanczos3 `resize_exact` into the `[20, 800]` width window |
//! | **Encode** | same format as the source; JPEG at quality 85 |
//!
//! The module is split into:
//! - **Format**: [`ImageKind`], the four accepted formats
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod format;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, Dimensions, EncodedImage, ImageBackend};
pub use calculations::{
    calculate_normalized_dimensions, calculate_scaled_height, calculate_target_width,
};
pub use format::ImageKind;
pub use operations::{NormalizedImage, normalize};
pub use params::{
    DecodeLimits, EncodeParams, JPEG_QUALITY, MAX_DECODE_ALLOC, MAX_DECODE_DIMENSION, MAX_WIDTH,
    MIN_WIDTH, NormalizeSettings, Quality, RESIZE_FILTER, ResizeFilter, ResizeParams, WidthBounds,
};
pub use rust_backend::RustBackend;
