use std::path::PathBuf;

use thiserror::Error;

/// The source tree could not be enumerated. Raised before any mutation.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source path not found: {0}")]
    NotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("source and destination cannot be the same directory: {0}")]
    PathConflict(PathBuf),

    #[error("a mirror operation is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path {0} is not under the source root")]
    OutsideSource(PathBuf),

    #[error("worker task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl MirrorError {
    /// Human-readable failure reason carried by `Outcome::Failed`.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
