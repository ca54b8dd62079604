//! Pre-decode file checks.
//!
//! [`inspect`] answers "is this a regular file no larger than the ceiling?"
//! from metadata alone. Only a [`CheckedFile`] can be read, and the read is
//! bounded by the same ceiling, so a file that grows after inspection is
//! still refused.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default size ceiling: 100 MiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error(
        "File size ({size} bytes) exceeds maximum allowed size ({limit} bytes): {}",
        .path.display()
    )]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("IO error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl GuardError {
    /// Classify a failed metadata or resolve call on `path`.
    ///
    /// An entry that exists but cannot be followed (a symlink loop) is
    /// `NotAFile`; a missing entry or a missing parent is `NotFound`.
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => GuardError::NotFound(path),
            io::ErrorKind::PermissionDenied => GuardError::Io { path, source },
            _ if path.symlink_metadata().is_ok() => GuardError::NotAFile(path),
            _ => GuardError::Io { path, source },
        }
    }
}

/// A path that passed [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFile {
    path: PathBuf,
    size: u64,
    limit: u64,
}

impl CheckedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes at inspection time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole file, refusing to buffer more than the ceiling.
    pub fn read(&self) -> Result<Vec<u8>, GuardError> {
        let io_err = |source| GuardError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(io_err)?;
        let mut bytes = Vec::with_capacity(self.size as usize);
        file.take(self.limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(io_err)?;

        let read = bytes.len() as u64;
        if read > self.limit {
            return Err(GuardError::TooLarge {
                path: self.path.clone(),
                size: read,
                limit: self.limit,
            });
        }
        Ok(bytes)
    }
}

/// Check existence, file type and size. Metadata only; nothing is opened.
pub fn inspect(path: &Path, limit: u64) -> Result<CheckedFile, GuardError> {
    let metadata =
        std::fs::metadata(path).map_err(|e| GuardError::from_io(path.to_path_buf(), e))?;
    if !metadata.is_file() {
        return Err(GuardError::NotAFile(path.to_path_buf()));
    }
    let size = metadata.len();
    if size > limit {
        return Err(GuardError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(CheckedFile {
        path: path.to_path_buf(),
        size,
        limit,
    })
}
