use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use super::cancel::CancellationSignal;
use super::directories::{DirectoryReplicator, PassResult};
use super::events::{emit_log, Event, EventSender};
use super::files::FilePlaceholderReplicator;
use super::progress::ProgressTracker;
use super::scanner::TreeScanner;
use crate::config::settings::Settings;
use crate::error::MirrorError;
use crate::models::log::LogEvent;
use crate::models::outcome::{OperationState, OperationSummary, Outcome};
use crate::models::request::MirrorRequest;

/// Starts mirror operations, at most one at a time.
pub struct Mirror {
    settings: Arc<Settings>,
    event_tx: EventSender,
    active: Arc<AtomicBool>,
}

impl Mirror {
    pub fn new(settings: Settings, event_tx: EventSender) -> Self {
        Self {
            settings: Arc::new(settings),
            event_tx,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn the operation on the current tokio runtime.
    ///
    /// Only `AlreadyRunning` is returned as an error here; every other
    /// failure, including an invalid request, is reported through the
    /// event channel as a `Failed` outcome.
    pub fn start(&self, request: MirrorRequest) -> Result<OperationHandle, MirrorError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MirrorError::AlreadyRunning);
        }
        let guard = ActiveGuard(Arc::clone(&self.active));

        let cancellation = CancellationSignal::new();
        let state = Arc::new(AtomicU8::new(OperationState::Idle as u8));
        let operation = MirrorOperation {
            request,
            settings: Arc::clone(&self.settings),
            event_tx: self.event_tx.clone(),
            cancellation: cancellation.clone(),
            state: Arc::clone(&state),
        };

        let task = tokio::spawn(operation.run(guard));

        Ok(OperationHandle {
            cancellation,
            state,
            event_tx: self.event_tx.clone(),
            task,
        })
    }
}

/// Clears the single-operation flag when dropped.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Caller-side view of a running operation.
pub struct OperationHandle {
    cancellation: CancellationSignal,
    state: Arc<AtomicU8>,
    event_tx: EventSender,
    task: JoinHandle<OperationSummary>,
}

impl OperationHandle {
    /// Request cooperative cancellation. The in-flight directory or file
    /// batch finishes first. Repeated calls are no-ops.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        if self.cancellation.cancel() {
            emit_log(&self.event_tx, LogEvent::warn("Cancelling operation..."));
        }
    }

    pub fn cancellation(&self) -> CancellationSignal {
        self.cancellation.clone()
    }

    pub fn state(&self) -> OperationState {
        OperationState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<OperationSummary, MirrorError> {
        Ok(self.task.await?)
    }
}

/// One run of scan, directory pass and file pass.
struct MirrorOperation {
    request: MirrorRequest,
    settings: Arc<Settings>,
    event_tx: EventSender,
    cancellation: CancellationSignal,
    state: Arc<AtomicU8>,
}

impl MirrorOperation {
    async fn run(self, guard: ActiveGuard) -> OperationSummary {
        let started = Instant::now();
        let tracker = Arc::new(ProgressTracker::new(Some(self.event_tx.clone())));

        let outcome = match self.execute(&tracker).await {
            Ok(PassResult::Finished) => {
                self.log(LogEvent::info(format!(
                    "Operation completed successfully in {:.2} seconds",
                    started.elapsed().as_secs_f64()
                )));
                Outcome::Completed
            }
            Ok(PassResult::Cancelled) => {
                self.log(LogEvent::warn("Operation was cancelled by user"));
                Outcome::Cancelled
            }
            Err(e) => {
                self.log(LogEvent::error(format!("Error: {}", e)));
                Outcome::Failed(e.reason())
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let summary = OperationSummary {
            outcome: outcome.clone(),
            completed: tracker.completed(),
            total: tracker.total(),
            elapsed_ms,
        };
        tracing::info!(
            outcome = %summary.outcome,
            completed = summary.completed,
            total = summary.total,
            elapsed_ms,
            "mirror operation finished"
        );

        self.set_state(outcome.state());
        // Release before reporting so a subscriber can start the next run on Finished.
        drop(tracker);
        drop(guard);
        let _ = self.event_tx.send(Event::Finished {
            outcome,
            elapsed_ms,
        });

        summary
    }

    async fn execute(&self, tracker: &Arc<ProgressTracker>) -> Result<PassResult, MirrorError> {
        let request = &self.request;
        request.validate()?;

        self.set_state(OperationState::Scanning);
        self.log(LogEvent::info("Scanning directory structure..."));
        let scan = TreeScanner::new(&self.settings)
            .scan(request.source_root.clone())
            .await?;

        for warning in &scan.warnings {
            self.log(LogEvent::warn(format!(
                "Could not read {}: {}",
                warning.path.display(),
                warning.message
            )));
        }
        self.log(LogEvent::info(format!(
            "Found {} items to process ({} directories, {} files)",
            scan.total_items(),
            scan.directory_count(),
            scan.file_count()
        )));
        tracker.set_total(scan.total_items());

        if self.cancellation.is_cancelled() {
            return Ok(PassResult::Cancelled);
        }

        self.set_state(OperationState::CreatingDirectories);
        self.log(LogEvent::info("Creating directory structure..."));
        let dirs = DirectoryReplicator::new(self.settings.yield_every)
            .replicate(&scan.directory_paths, request, &self.cancellation, tracker)
            .await?;
        if dirs == PassResult::Cancelled {
            return Ok(PassResult::Cancelled);
        }

        self.set_state(OperationState::CreatingFiles);
        self.log(LogEvent::info("Creating file structure..."));
        let mut files = FilePlaceholderReplicator::new(self.settings.batch_size);
        if self.settings.log_skipped_files {
            files = files.with_skip_log(self.event_tx.clone());
        }
        files
            .replicate(&scan.file_paths, request, &self.cancellation, tracker)
            .await
    }

    fn set_state(&self, state: OperationState) {
        self.state.store(state as u8, Ordering::SeqCst);
        tracing::debug!(?state, "operation state changed");
        let _ = self.event_tx.send(Event::StateChanged { state });
    }

    fn log(&self, event: LogEvent) {
        emit_log(&self.event_tx, event);
    }
}
