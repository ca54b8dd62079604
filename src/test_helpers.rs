//! Shared test utilities for the image-inline test suite.
//!
//! Provides a temp-dir sandbox and synthetic image fixtures in each of the
//! four supported formats.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, root) = sandbox();
//! write_fixture(root.path(), "logo.png", ImageKind::Png, 400, 100);
//! ```

use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::imaging::ImageKind;
use crate::sandbox::AllowedRoot;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

// =========================================================================
// Fixture setup
// =========================================================================

/// A fresh temp directory and an [`AllowedRoot`] pointing at it.
///
/// Keep the `TempDir` alive for the duration of the test.
pub fn sandbox() -> (TempDir, AllowedRoot) {
    let tmp = TempDir::new().unwrap();
    let root = AllowedRoot::new(tmp.path()).unwrap();
    (tmp, root)
}

/// A deterministic RGB gradient, so encoders have real content to work on.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a gradient of the given size in `kind`.
pub fn encode_fixture(kind: ImageKind, width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(gradient(width, height));
    let mut bytes = Vec::new();
    match kind {
        ImageKind::Jpeg => img
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 90))
            .unwrap(),
        other => img
            .write_to(&mut Cursor::new(&mut bytes), other.image_format())
            .unwrap(),
    }
    bytes
}

/// Write an encoded fixture to `dir/name` and return its path.
pub fn write_fixture(dir: &Path, name: &str, kind: ImageKind, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, encode_fixture(kind, width, height)).unwrap();
    path
}
