use std::path::PathBuf;

use super::cancel::CancellationSignal;
use super::path::translate;
use super::progress::ProgressTracker;
use crate::error::MirrorError;
use crate::models::request::MirrorRequest;

/// How a replication pass ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassResult {
    Finished,
    Cancelled,
}

/// Creates the destination directory tree, one directory at a time.
pub struct DirectoryReplicator {
    yield_every: usize,
}

impl DirectoryReplicator {
    pub fn new(yield_every: usize) -> Self {
        Self {
            yield_every: yield_every.max(1),
        }
    }

    /// Create `destination_root`, then every directory of `directories` in
    /// the given order. Parents must precede children; the scanner's
    /// shallow-first order guarantees that.
    ///
    /// Existing directories are accepted. Nothing is rolled back on
    /// cancellation or failure.
    pub async fn replicate(
        &self,
        directories: &[PathBuf],
        request: &MirrorRequest,
        cancellation: &CancellationSignal,
        tracker: &ProgressTracker,
    ) -> Result<PassResult, MirrorError> {
        create_dir(request.destination_root.clone()).await?;

        for (i, dir) in directories.iter().enumerate() {
            if cancellation.is_cancelled() {
                tracing::debug!(created = i, "directory pass cancelled");
                return Ok(PassResult::Cancelled);
            }

            let target = translate(dir, &request.source_root, &request.destination_root)?;
            create_dir(target).await?;
            tracker.increment();

            if (i + 1) % self.yield_every == 0 {
                tokio::task::yield_now().await;
            }
        }

        Ok(PassResult::Finished)
    }
}

async fn create_dir(path: PathBuf) -> Result<(), MirrorError> {
    match tokio::fs::create_dir_all(&path).await {
        Ok(()) => Ok(()),
        Err(source) => Err(MirrorError::DirectoryCreate { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ghostfile_dirs_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn creates_tree_and_counts_each_directory() {
        let root = temp_root("basic");
        let src = root.join("src");
        let dst = root.join("dst");
        let dirs = vec![src.join("a"), src.join("b"), src.join("b/c")];
        let request = MirrorRequest::new(&src, &dst);
        let tracker = ProgressTracker::new(None);

        let result = DirectoryReplicator::new(20)
            .replicate(&dirs, &request, &CancellationSignal::new(), &tracker)
            .await
            .unwrap();

        assert_eq!(result, PassResult::Finished);
        assert!(dst.join("a").is_dir());
        assert!(dst.join("b/c").is_dir());
        assert_eq!(tracker.completed(), 3);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn cancelled_before_start_creates_only_the_root() {
        let root = temp_root("cancelled");
        let src = root.join("src");
        let dst = root.join("dst");
        let dirs = vec![src.join("a")];
        let request = MirrorRequest::new(&src, &dst);
        let tracker = ProgressTracker::new(None);
        let signal = CancellationSignal::new();
        signal.cancel();

        let result = DirectoryReplicator::new(20)
            .replicate(&dirs, &request, &signal, &tracker)
            .await
            .unwrap();

        assert_eq!(result, PassResult::Cancelled);
        assert!(dst.is_dir());
        assert!(!dst.join("a").exists());
        assert_eq!(tracker.completed(), 0);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn blocked_destination_fails() {
        let root = temp_root("blocked");
        std::fs::create_dir_all(&root).unwrap();
        let src = root.join("src");
        // A regular file where the destination root should go
        let dst = root.join("dst");
        std::fs::write(&dst, b"").unwrap();
        let request = MirrorRequest::new(&src, &dst);

        let err = DirectoryReplicator::new(20)
            .replicate(
                &[src.join("a")],
                &request,
                &CancellationSignal::new(),
                &ProgressTracker::new(None),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, MirrorError::DirectoryCreate { .. }));

        let _ = std::fs::remove_dir_all(&root);
    }
}
