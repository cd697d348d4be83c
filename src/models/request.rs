use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MirrorError;

/// Source and destination of one mirror operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRequest {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
}

impl MirrorRequest {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Check the request before any filesystem mutation.
    ///
    /// Paths are compared after lexical normalization, case-sensitively, so
    /// `/a/b/` and `/a/./b` conflict while `/a/B` and `/a/b` do not.
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.source_root.as_os_str().is_empty() {
            return Err(MirrorError::InvalidRequest("source path is empty".into()));
        }
        if self.destination_root.as_os_str().is_empty() {
            return Err(MirrorError::InvalidRequest(
                "destination path is empty".into(),
            ));
        }
        if normalize(&self.source_root) == normalize(&self.destination_root) {
            return Err(MirrorError::PathConflict(self.source_root.clone()));
        }
        Ok(())
    }
}

/// Lexical normalization: drops `.` components and trailing separators.
/// `..` is kept as-is; resolving it would need the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_identical_paths() {
        let req = MirrorRequest::new("/data/src", "/data/src");
        assert!(matches!(req.validate(), Err(MirrorError::PathConflict(_))));
    }

    #[test]
    fn rejects_paths_equal_after_normalization() {
        let req = MirrorRequest::new("/data/src/", "/data/./src");
        assert!(matches!(req.validate(), Err(MirrorError::PathConflict(_))));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let req = MirrorRequest::new("/data/src", "/data/SRC");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_empty_paths() {
        assert!(matches!(
            MirrorRequest::new("", "/dst").validate(),
            Err(MirrorError::InvalidRequest(_))
        ));
        assert!(matches!(
            MirrorRequest::new("/src", "").validate(),
            Err(MirrorError::InvalidRequest(_))
        ));
    }
}
