use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::cancel::CancellationSignal;
use super::directories::PassResult;
use super::events::{emit_log, EventSender};
use super::path::translate;
use super::progress::ProgressTracker;
use crate::error::MirrorError;
use crate::models::log::LogEvent;
use crate::models::request::MirrorRequest;

/// Creates one placeholder on disk.
pub trait PlaceholderWriter: Send + Sync + 'static {
    fn create(&self, path: &Path) -> std::io::Result<()>;
}

/// Creates a zero-byte file. An existing file is left untouched.
pub struct EmptyFileWriter;

impl PlaceholderWriter for EmptyFileWriter {
    fn create(&self, path: &Path) -> std::io::Result<()> {
        OpenOptions::new().write(true).create(true).open(path)?;
        Ok(())
    }
}

/// Creates placeholder files in fixed-size batches of concurrent units.
///
/// A batch is fully joined before the next one starts, so at most
/// `batch_size` creations are outstanding at any time. Cancellation is
/// checked between batches only.
pub struct FilePlaceholderReplicator {
    batch_size: usize,
    writer: Arc<dyn PlaceholderWriter>,
    skip_log: Option<EventSender>,
}

impl FilePlaceholderReplicator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            writer: Arc::new(EmptyFileWriter),
            skip_log: None,
        }
    }

    pub fn with_writer(mut self, writer: Arc<dyn PlaceholderWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Emit a debug log event for every file that could not be created.
    pub fn with_skip_log(mut self, event_tx: EventSender) -> Self {
        self.skip_log = Some(event_tx);
        self
    }

    pub async fn replicate(
        &self,
        files: &[PathBuf],
        request: &MirrorRequest,
        cancellation: &CancellationSignal,
        tracker: &Arc<ProgressTracker>,
    ) -> Result<PassResult, MirrorError> {
        let total_batches = files.len().div_ceil(self.batch_size);

        for (batch_no, batch) in files.chunks(self.batch_size).enumerate() {
            if cancellation.is_cancelled() {
                tracing::debug!(batch = batch_no, total_batches, "file pass cancelled");
                return Ok(PassResult::Cancelled);
            }

            let mut handles = Vec::with_capacity(batch.len());
            for source in batch {
                let target = match translate(source, &request.source_root, &request.destination_root) {
                    Ok(target) => target,
                    Err(e) => {
                        self.report_skip(source, &e.to_string());
                        continue;
                    }
                };
                let writer = Arc::clone(&self.writer);
                let tracker = Arc::clone(tracker);
                let handle = tokio::task::spawn_blocking(move || {
                    writer.create(&target).map(|()| tracker.increment())
                });
                handles.push((source, handle));
            }

            // Join barrier: every unit of this batch finishes before the next batch
            for (source, handle) in handles {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => self.report_skip(source, &e.to_string()),
                    Err(e) => self.report_skip(source, &format!("worker panicked: {}", e)),
                }
            }

            tracing::trace!(batch = batch_no + 1, total_batches, "file batch joined");
        }

        Ok(PassResult::Finished)
    }

    // Per-file failures never fail the pass.
    fn report_skip(&self, source: &Path, reason: &str) {
        tracing::debug!(path = %source.display(), "skipped placeholder: {}", reason);
        if let Some(tx) = &self.skip_log {
            emit_log(
                tx,
                LogEvent::debug(format!("Skipped {}: {}", source.display(), reason)),
            );
        }
    }
}
