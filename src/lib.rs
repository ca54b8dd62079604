//! # image-inline
//!
//! A sandboxed image reader. Give it a path; it proves the path lives under an
//! allowed root, refuses oversized files before decoding them, brings the
//! image width into a fixed window, re-encodes it in its own format, and
//! hands back a `data:image/<format>;base64,...` string.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Resolve    path   →  canonical path under the allowed root   (sandbox)
//! 2. Guard      path   →  regular file within the size ceiling    (guard)
//! 3. Normalize  bytes  →  decoded, resized, re-encoded image      (imaging)
//! 4. Encode     image  →  data URI text                           (data_uri)
//! ```
//!
//! Each stage can end the call with its own classified error; there are no
//! retries and no shared mutable state between calls. [`reader::ImageReader`]
//! wires the stages together.
//!
//! ```no_run
//! use image_inline::reader::{ImageReader, ImageRequest, ReaderSettings};
//! use image_inline::sandbox::AllowedRoot;
//!
//! let root = AllowedRoot::new("/srv/images")?;
//! let reader = ImageReader::new(root, ReaderSettings::default());
//! let uri = reader.read_data_uri(&ImageRequest::new("logo.png"))?;
//! assert!(uri.starts_with("data:image/png;base64,"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sandbox`] | Stage 1: lexical + canonical resolution, segment-aware containment |
//! | [`guard`] | Stage 2: existence, file type and size checks; bounded read |
//! | [`imaging`] | Stage 3: sniff, decode, resize into `[20, 800]`, re-encode |
//! | [`data_uri`] | Stage 4: base64 data URI encoding (and decoding for inspection) |
//! | [`reader`] | The pipeline, request/outcome types, error classification |
//! | [`config`] | Layered `config.toml` + environment loading and validation |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sniff First, Extension Second
//!
//! The format is taken from the file's magic bytes. The extension is only
//! consulted when no signature matches, and even then the decoder has the
//! final word: a text file renamed to `.png` fails as an invalid image.
//!
//! ## Size Before Pixels
//!
//! The size ceiling is checked from metadata before the file is opened, and
//! the read itself is bounded by the same ceiling. Decoding additionally runs
//! under `image::Limits` so a small file cannot claim enormous dimensions.

pub mod config;
pub mod data_uri;
pub mod guard;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod reader;
pub mod sandbox;

pub use reader::{ErrorKind, ImageReader, ImageRequest, ReadError, ReadOutcome, ReaderSettings};
pub use sandbox::AllowedRoot;

#[cfg(test)]
pub(crate) mod test_helpers;
