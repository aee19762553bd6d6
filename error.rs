use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Structured failure reasons for vault operations.
///
/// Operations never surface a raw OS error code; every filesystem failure is
/// classified here together with the path it occurred on.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The entry does not exist
    #[error("{}: not found", .0.display())]
    NotFound(PathBuf),

    /// The entry exists but is not a directory
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The directory still has children
    #[error("{}: directory not empty", .0.display())]
    NotEmpty(PathBuf),

    /// The OS denied access to the entry
    #[error("{}: permission denied", .0.display())]
    PermissionDenied(PathBuf),

    /// A cipher key of length zero was supplied
    #[error("cipher key must not be empty")]
    EmptyKey,

    /// No password file exists yet
    #[error("no password has been set")]
    NoPasswordSet,

    /// The supplied password does not match the stored one
    #[error("incorrect password")]
    BadPassword,

    /// Any other OS-level failure, with the source preserved
    #[error("{}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: io::Error },
}

impl VaultError {
    /// Classify an OS error against the path it occurred on.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty(path),
            _ => Self::Io { path, source: err },
        }
    }

    /// Coarse kind of this error, for outcomes that carry the reason as data.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::NotEmpty(_) => ErrorKind::NotEmpty,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            _ => ErrorKind::Other,
        }
    }
}

/// Coarse error kind carried inside a partial tree-walk failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotADirectory,
    NotEmpty,
    PermissionDenied,
    /// The tree walk hit the configured depth ceiling
    DepthLimitExceeded,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::NotADirectory => "not a directory",
            Self::NotEmpty => "not empty",
            Self::PermissionDenied => "permission denied",
            Self::DepthLimitExceeded => "depth limit exceeded",
            Self::Other => "I/O error",
        };
        f.write_str(s)
    }
}
