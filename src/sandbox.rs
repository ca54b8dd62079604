//! Path resolution against the allowed root.
//!
//! Every path a caller hands in is resolved to an absolute path and proven to
//! live under [`AllowedRoot`] before anything is opened. Resolution happens in
//! two passes:
//!
//! 1. **Lexical**: relative paths are joined onto the root, then `.` and `..`
//!    are folded away without touching the filesystem. `../../etc/passwd`
//!    is rejected here whether or not the target exists. The result may sit
//!    under either spelling of the root: the one it was configured with
//!    (say `/srv/images`, a symlink) or its canonical form.
//! 2. **Canonical**: the OS resolves symlinks. Only the canonical root
//!    counts here, so a link inside the root that points outside it is
//!    rejected.
//!
//! Containment is checked with [`Path::starts_with`], which compares whole
//! components: `/data2/x` is not inside `/data`.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("path must be provided")]
    MissingPath,
    #[error(
        "Access denied: Path ({}) must be within allowed directory ({})",
        .path.display(),
        .root.display()
    )]
    AccessDenied { path: PathBuf, root: PathBuf },
    /// The path stayed inside the root lexically but the OS could not resolve it.
    #[error("cannot resolve {}: {source}", .path.display())]
    Unresolved {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("allowed root {} is not usable: {source}", .path.display())]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("allowed root {} is not a directory", .0.display())]
    RootNotADirectory(PathBuf),
}

/// The single directory outside of which no file access is permitted.
///
/// Holds the canonical absolute path, plus the absolute spelling it was
/// configured with. There is no way to change either after construction;
/// clone it to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoot {
    canonical: PathBuf,
    configured: PathBuf,
}

impl AllowedRoot {
    /// Canonicalize `dir` and check that it is a directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let dir = dir.as_ref();
        let invalid = |source| SandboxError::InvalidRoot {
            path: dir.to_path_buf(),
            source,
        };
        let canonical = dir.canonicalize().map_err(invalid)?;
        if !canonical.is_dir() {
            return Err(SandboxError::RootNotADirectory(canonical));
        }
        let configured = normalize_lexically(&std::path::absolute(dir).map_err(invalid)?);
        Ok(Self {
            canonical,
            configured,
        })
    }

    /// The canonical root.
    pub fn path(&self) -> &Path {
        &self.canonical
    }

    /// The root as configured, made absolute and lexically normalized.
    /// Equal to [`path`](Self::path) unless the configured path runs
    /// through a symlink.
    pub fn configured_path(&self) -> &Path {
        &self.configured
    }

    /// Component-wise containment in the canonical root. The root contains itself.
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.canonical)
    }

    /// Containment before symlinks are resolved: either spelling of the root counts.
    fn contains_lexically(&self, candidate: &Path) -> bool {
        self.contains(candidate) || candidate.starts_with(&self.configured)
    }

    /// Resolve a caller-supplied path to a canonical path inside the root.
    ///
    /// Performs metadata lookups only; no file is opened.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, SandboxError> {
        if requested.trim().is_empty() {
            return Err(SandboxError::MissingPath);
        }

        let requested = Path::new(requested);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.canonical.join(requested)
        };

        let lexical = normalize_lexically(&joined);
        if !self.contains_lexically(&lexical) {
            return Err(self.denied(lexical));
        }

        let canonical = lexical
            .canonicalize()
            .map_err(|source| SandboxError::Unresolved {
                path: lexical.clone(),
                source,
            })?;
        if canonical != lexical {
            debug!(from = %lexical.display(), to = %canonical.display(), "followed symlinks");
        }
        if !self.contains(&canonical) {
            return Err(self.denied(canonical));
        }
        Ok(canonical)
    }

    fn denied(&self, path: PathBuf) -> SandboxError {
        SandboxError::AccessDenied {
            path,
            root: self.canonical.clone(),
        }
    }
}

/// Fold `.` and `..` components without consulting the filesystem.
///
/// `..` never climbs above the filesystem root or a path prefix.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
