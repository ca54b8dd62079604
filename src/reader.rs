//! The read pipeline: resolve → guard → normalize → encode.
//!
//! [`ImageReader`] owns the immutable pieces (allowed root, settings, backend)
//! and runs one self-contained pipeline per [`ImageRequest`]. Every stage can
//! end the call with its own error; nothing is retried. The reader is
//! `Send + Sync` when its backend is, so one instance can serve any number of
//! threads.

use crate::config::ReaderConfig;
use crate::data_uri;
use crate::guard::{self, GuardError, MAX_FILE_SIZE};
use crate::imaging::{
    BackendError, DecodeLimits, Dimensions, ImageBackend, ImageKind, NormalizeSettings, Quality,
    RustBackend, WidthBounds, normalize,
};
use crate::sandbox::{AllowedRoot, SandboxError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Classification of a failed read. Stable across message wording changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    MissingPath,
    AccessDenied,
    NotFound,
    NotAFile,
    TooLarge,
    InvalidImage,
    UnsupportedFormat,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Sandbox(SandboxError),
    #[error(transparent)]
    File(#[from] GuardError),
    #[error("File is not a valid image: {}: {source}", .path.display())]
    Image { path: PathBuf, source: BackendError },
}

impl From<SandboxError> for ReadError {
    /// Paths that stayed inside the root but could not be resolved are
    /// reported the way the file guard would report them.
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::Unresolved { path, source } => {
                ReadError::File(GuardError::from_io(path, source))
            }
            other => ReadError::Sandbox(other),
        }
    }
}

impl ReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::Sandbox(SandboxError::MissingPath) => ErrorKind::MissingPath,
            ReadError::Sandbox(SandboxError::AccessDenied { .. }) => ErrorKind::AccessDenied,
            ReadError::Sandbox(SandboxError::Unresolved { .. }) => ErrorKind::NotFound,
            ReadError::Sandbox(
                SandboxError::InvalidRoot { .. } | SandboxError::RootNotADirectory(_),
            ) => ErrorKind::Io,
            ReadError::File(GuardError::NotFound(_)) => ErrorKind::NotFound,
            ReadError::File(GuardError::NotAFile(_)) => ErrorKind::NotAFile,
            ReadError::File(GuardError::TooLarge { .. }) => ErrorKind::TooLarge,
            ReadError::File(GuardError::Io { .. }) => ErrorKind::Io,
            ReadError::Image {
                source: BackendError::UnsupportedFormat { .. },
                ..
            } => ErrorKind::UnsupportedFormat,
            ReadError::Image { .. } => ErrorKind::InvalidImage,
        }
    }
}

/// One read call. `max_size` falls back to the reader's configured ceiling.
///
/// Deserializes from the tool-call argument shape `{"path": ..., "max_size": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "max_size")]
    pub max_size_bytes: Option<u64>,
}

impl ImageRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_size_bytes: None,
        }
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size_bytes = Some(bytes);
        self
    }
}

/// A successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOutcome {
    pub source: PathBuf,
    pub format: ImageKind,
    pub original: Dimensions,
    pub output: Dimensions,
    pub file_size: u64,
    pub encoded_len: usize,
    pub data_uri: String,
}

impl ReadOutcome {
    pub fn was_resized(&self) -> bool {
        self.original != self.output
    }
}

/// Reader-wide limits and normalization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    pub max_file_size: u64,
    pub normalize: NormalizeSettings,
}

impl ReaderSettings {
    /// Build from validated config values.
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self {
            max_file_size: config.limits.max_file_size,
            normalize: NormalizeSettings {
                bounds: WidthBounds {
                    min: config.resize.min_width,
                    max: config.resize.max_width,
                },
                filter: config.resize.filter,
                jpeg_quality: Quality::new(config.encoding.jpeg_quality),
                decode: DecodeLimits {
                    max_dimension: config.limits.max_dimension,
                    max_alloc: config.limits.max_alloc,
                },
            },
        }
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            normalize: NormalizeSettings::default(),
        }
    }
}

pub struct ImageReader<B: ImageBackend = RustBackend> {
    root: AllowedRoot,
    settings: ReaderSettings,
    backend: B,
}

impl ImageReader<RustBackend> {
    pub fn new(root: AllowedRoot, settings: ReaderSettings) -> Self {
        Self::with_backend(root, settings, RustBackend::new())
    }
}

impl<B: ImageBackend> ImageReader<B> {
    /// Use a specific backend (allows testing with mock).
    pub fn with_backend(root: AllowedRoot, settings: ReaderSettings, backend: B) -> Self {
        Self {
            root,
            settings,
            backend,
        }
    }

    pub fn root(&self) -> &AllowedRoot {
        &self.root
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    /// Run the full pipeline for one request.
    pub fn read(&self, request: &ImageRequest) -> Result<ReadOutcome, ReadError> {
        self.run(request).inspect_err(|e| {
            warn!(path = %request.path, kind = %e.kind(), error = %e, "image read rejected");
        })
    }

    /// Run the pipeline and return only the data URI text.
    pub fn read_data_uri(&self, request: &ImageRequest) -> Result<String, ReadError> {
        self.read(request).map(|outcome| outcome.data_uri)
    }

    fn run(&self, request: &ImageRequest) -> Result<ReadOutcome, ReadError> {
        let limit = request
            .max_size_bytes
            .unwrap_or(self.settings.max_file_size);

        let resolved = self.root.resolve(&request.path)?;
        debug!(path = %resolved.display(), "resolved inside allowed root");

        let checked = guard::inspect(&resolved, limit)?;
        debug!(size = checked.size(), limit, "passed file guard");

        let bytes = checked.read()?;
        let normalized = normalize(
            &self.backend,
            &bytes,
            checked.path(),
            &self.settings.normalize,
        )
        .map_err(|source| ReadError::Image {
            path: resolved.clone(),
            source,
        })?;
        drop(bytes);

        let encoded = normalized.encoded;
        let data_uri = data_uri::encode(encoded.format, &encoded.bytes);
        info!(
            path = %resolved.display(),
            format = %encoded.format,
            width = encoded.dimensions.width,
            height = encoded.dimensions.height,
            bytes = encoded.bytes.len(),
            "image read"
        );

        Ok(ReadOutcome {
            source: resolved,
            format: encoded.format,
            original: normalized.original,
            output: encoded.dimensions,
            file_size: checked.size(),
            encoded_len: encoded.bytes.len(),
            data_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{sandbox, write_fixture};
    use std::fs::{self, File};

    #[test]
    fn request_deserializes_tool_arguments() {
        let request: ImageRequest =
            serde_json::from_str(r#"{"path": "a.png", "max_size": 1024}"#).unwrap();
        assert_eq!(request, ImageRequest::new("a.png").with_max_size(1024));

        let request: ImageRequest = serde_json::from_str(r#"{"path": "a.png"}"#).unwrap();
        assert_eq!(request.max_size_bytes, None);
    }

    #[test]
    fn absent_path_is_missing_path() {
        let (_tmp, root) = sandbox();
        let reader = ImageReader::new(root, ReaderSettings::default());
        let request: ImageRequest = serde_json::from_str("{}").unwrap();

        let err = reader.read(&request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPath);
    }

    #[test]
    fn escape_is_denied_before_any_read() {
        let (_tmp, root) = sandbox();
        let backend = MockBackend::decoding(ImageKind::Png, 10, 10);
        let reader = ImageReader::with_backend(root, ReaderSettings::default(), backend);

        let err = reader.read(&ImageRequest::new("../../etc/passwd")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert!(reader.backend.get_operations().is_empty());
    }

    #[test]
    fn oversized_file_never_reaches_decoder() {
        let (_tmp, root) = sandbox();
        let file = File::create(root.path().join("huge.png")).unwrap();
        file.set_len(150 * 1024 * 1024).unwrap();
        let backend = MockBackend::decoding(ImageKind::Png, 10, 10);
        let reader = ImageReader::with_backend(root, ReaderSettings::default(), backend);

        let err = reader.read(&ImageRequest::new("huge.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLarge);
        assert!(!reader.backend.decode_attempted());
        assert!(reader.backend.get_operations().is_empty());
    }

    #[test]
    fn request_ceiling_overrides_default() {
        let (_tmp, root) = sandbox();
        write_fixture(root.path(), "logo.png", ImageKind::Png, 400, 100);
        let reader = ImageReader::new(root, ReaderSettings::default());

        let err = reader
            .read(&ImageRequest::new("logo.png").with_max_size(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLarge);
        assert!(err.to_string().contains("(10 bytes)"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_tmp, root) = sandbox();
        let reader = ImageReader::new(root, ReaderSettings::default());

        let err = reader.read(&ImageRequest::new("ghost.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("File does not exist"));
    }

    #[test]
    fn directory_is_not_a_file() {
        let (_tmp, root) = sandbox();
        fs::create_dir(root.path().join("album")).unwrap();
        let reader = ImageReader::new(root, ReaderSettings::default());

        let err = reader.read(&ImageRequest::new("album")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAFile);
    }

    #[test]
    fn text_with_text_extension_is_unsupported_format() {
        let (_tmp, root) = sandbox();
        fs::write(root.path().join("notes.txt"), "just words").unwrap();
        let reader = ImageReader::new(root, ReaderSettings::default());

        let err = reader.read(&ImageRequest::new("notes.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn text_renamed_to_png_is_invalid_image() {
        let (_tmp, root) = sandbox();
        fs::write(root.path().join("fake.png"), "not really a png").unwrap();
        let reader = ImageReader::new(root, ReaderSettings::default());

        let err = reader.read(&ImageRequest::new("fake.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert!(err.to_string().contains("fake.png"));
    }

    #[test]
    fn configured_settings_flow_into_normalizer() {
        let (_tmp, root) = sandbox();
        write_fixture(root.path(), "wide.png", ImageKind::Png, 300, 150);
        let settings = ReaderSettings {
            normalize: NormalizeSettings {
                bounds: WidthBounds { min: 10, max: 100 },
                ..NormalizeSettings::default()
            },
            ..ReaderSettings::default()
        };
        let reader = ImageReader::new(root, settings);

        let outcome = reader.read(&ImageRequest::new("wide.png")).unwrap();
        assert_eq!(outcome.output, Dimensions { width: 100, height: 50 });
        assert!(outcome.was_resized());
    }

    #[test]
    fn decode_allocation_limit_is_invalid_image_naming_the_limit() {
        let (_tmp, root) = sandbox();
        write_fixture(root.path(), "logo.png", ImageKind::Png, 400, 100);
        let settings = ReaderSettings {
            normalize: NormalizeSettings {
                decode: DecodeLimits {
                    max_alloc: 4096,
                    ..DecodeLimits::default()
                },
                ..NormalizeSettings::default()
            },
            ..ReaderSettings::default()
        };
        let reader = ImageReader::new(root, settings);

        let err = reader.read(&ImageRequest::new("logo.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert!(err.to_string().contains("4096-byte decode limit"));
    }

    #[test]
    fn read_data_uri_returns_only_text() {
        let (_tmp, root) = sandbox();
        write_fixture(root.path(), "logo.png", ImageKind::Png, 400, 100);
        let reader = ImageReader::new(root, ReaderSettings::default());

        let text = reader.read_data_uri(&ImageRequest::new("logo.png")).unwrap();
        assert!(text.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn reader_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImageReader>();
    }
}
