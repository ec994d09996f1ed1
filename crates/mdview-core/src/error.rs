//! Error types for `mdview-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`. Directory Service failures
//! map onto the I/O-class variants; legality violations raised by the
//! move/rename reconciler are carried by [`CoreError::InvalidOperation`].

use std::path::PathBuf;

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or let the user retry the action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The destination path is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A file or directory name is invalid (empty, contains path separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A move, rename, create or delete request broke a legality rule.
    ///
    /// Raised before any Directory Service call, so nothing changed.
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] MoveRejection),

    /// A directory listing that this request joined while it was in flight failed.
    #[error("failed to list {path}: {message}")]
    FetchFailed { path: PathBuf, message: String },

    /// Navigation left the directory the session is rooted at.
    #[error("outside the explorer root: {0}")]
    OutsideRoot(PathBuf),

    /// The file watcher could not be started or switched.
    #[error("watch error: {0}")]
    Watch(String),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Maps a raw I/O error for `path` onto the most specific variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.into()),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.into()),
            _ => Self::Io(err),
        }
    }
}

/// Why the reconciler refused a relocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// Files are not valid drop targets.
    #[error("{0} is not a directory")]
    TargetNotDirectory(PathBuf),

    /// Source and target are the same path.
    #[error("cannot move {0} onto itself")]
    SameAsSource(PathBuf),

    /// The target lies inside the source directory.
    #[error("cannot move {source_path} into its own descendant {target}")]
    IntoDescendant {
        source_path: PathBuf,
        target: PathBuf,
    },

    /// The entry already lives in the target directory.
    #[error("{0} is already in place")]
    AlreadyInPlace(PathBuf),

    /// Another entry already occupies the destination path.
    #[error("{0} already exists")]
    Collision(PathBuf),

    /// The session root cannot be moved, renamed or deleted.
    #[error("cannot modify the root {0}")]
    Root(PathBuf),
}

/// Convenience alias used throughout `mdview-core`.
pub type CoreResult<T> = Result<T, CoreError>;
