use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Everything found under a source root, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Shallowest first: sorted by path length, so a parent always precedes its children.
    pub directory_paths: Vec<PathBuf>,
    pub file_paths: Vec<PathBuf>,
    pub warnings: Vec<ScanWarning>,
    pub scan_duration: Duration,
}

impl ScanResult {
    pub fn directory_count(&self) -> usize {
        self.directory_paths.len()
    }

    pub fn file_count(&self) -> usize {
        self.file_paths.len()
    }

    /// Items the mirror will attempt to create (the root itself is not counted).
    pub fn total_items(&self) -> usize {
        self.directory_count() + self.file_count()
    }
}

/// A nested entry the scanner could not read. The scan continues without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub kind: ScanWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanWarningKind {
    PermissionDenied,
    NotFound,
    SymlinkCycle,
    IoError,
}

impl ScanWarningKind {
    pub fn from_io(e: &std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::IoError,
        }
    }
}
