use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::cursor;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};

use crate::config::settings::Settings;
use crate::core::events::{self, Event, EventReceiver};
use crate::core::operation::{Mirror, OperationHandle};
use crate::core::scanner::TreeScanner;
use crate::models::log::{LogEvent, LogLevel};
use crate::models::outcome::{OperationReport, OperationState, OperationSummary, Outcome};
use crate::models::request::MirrorRequest;
use crate::ui::progress_line::ProgressLine;

/// Latest progress figures seen on the event channel.
#[derive(Debug, Default)]
struct ViewState {
    completed: usize,
    total: usize,
    percentage: u8,
    status: String,
    history: Vec<LogEvent>,
}

pub struct App {
    request: MirrorRequest,
    settings: Settings,
    quiet: bool,
    draw_progress: bool,
}

impl App {
    pub fn new(request: MirrorRequest, settings: Settings, quiet: bool) -> Self {
        Self {
            request,
            settings,
            quiet,
            draw_progress: !quiet && std::io::stderr().is_terminal(),
        }
    }

    /// Run one mirror operation to its terminal outcome.
    /// Ctrl-C requests cancellation; the in-flight batch still completes.
    pub async fn run(&mut self) -> anyhow::Result<OperationReport> {
        let started_at = chrono::Local::now();
        let (event_tx, event_rx) = events::create_event_channel();
        let mirror = Mirror::new(self.settings.clone(), event_tx);
        let handle = mirror.start(self.request.clone())?;

        let view = self.event_loop(event_rx, &handle).await;
        let summary = handle.wait().await?;

        Ok(OperationReport {
            request: self.request.clone(),
            started_at,
            summary,
            log: view.history,
        })
    }

    /// Scan only, report what a run would create.
    /// A request a run would reject ends as `Failed` without scanning.
    pub async fn preview(&self) -> anyhow::Result<OperationReport> {
        let started_at = chrono::Local::now();
        let mut history = Vec::new();

        if let Err(e) = self.request.validate() {
            self.record(&mut history, LogEvent::error(format!("Error: {}", e)));
            return Ok(OperationReport {
                request: self.request.clone(),
                started_at,
                summary: OperationSummary {
                    outcome: Outcome::Failed(e.reason()),
                    completed: 0,
                    total: 0,
                    elapsed_ms: 0,
                },
                log: history,
            });
        }

        self.record(&mut history, LogEvent::info("Scanning directory structure..."));

        let scan = TreeScanner::new(&self.settings)
            .scan(self.request.source_root.clone())
            .await?;

        for warning in &scan.warnings {
            self.record(
                &mut history,
                LogEvent::warn(format!(
                    "Could not read {}: {}",
                    warning.path.display(),
                    warning.message
                )),
            );
        }
        self.record(
            &mut history,
            LogEvent::info(format!(
                "Found {} items to process ({} directories, {} files)",
                scan.total_items(),
                scan.directory_count(),
                scan.file_count()
            )),
        );

        Ok(OperationReport {
            request: self.request.clone(),
            started_at,
            summary: OperationSummary {
                outcome: Outcome::Completed,
                completed: 0,
                total: scan.total_items(),
                elapsed_ms: scan.scan_duration.as_millis() as u64,
            },
            log: history,
        })
    }

    async fn event_loop(&self, mut event_rx: EventReceiver, handle: &OperationHandle) -> ViewState {
        let mut view = ViewState {
            status: OperationState::Idle.status_text().to_string(),
            ..Default::default()
        };
        let started = std::time::Instant::now();
        let mut tick_interval = tokio::time::interval(Duration::from_millis(100));
        let mut ctrl_c_seen = false;

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(Event::Log(log)) => {
                            self.clear_progress();
                            self.record(&mut view.history, log);
                        }
                        Some(Event::Progress { completed, total, percentage: pct, status_text }) => {
                            // Units report concurrently; never let the view go backwards
                            if completed >= view.completed || total != view.total {
                                view.completed = completed;
                                view.total = total;
                                view.percentage = pct;
                            }
                            tracing::trace!("{}", status_text);
                        }
                        Some(Event::StateChanged { state }) => {
                            view.status = state.status_text().to_string();
                        }
                        Some(Event::Finished { outcome, elapsed_ms }) => {
                            self.clear_progress();
                            tracing::debug!(%outcome, elapsed_ms, "operation finished");
                            return view;
                        }
                        // Every sender is gone without a Finished event
                        None => return view,
                    }
                }
                _ = tokio::signal::ctrl_c(), if !ctrl_c_seen => {
                    ctrl_c_seen = true;
                    view.status = "Cancelling...".to_string();
                    handle.cancel();
                }
                _ = tick_interval.tick() => {
                    self.draw(&view, started.elapsed().as_secs());
                }
            }
        }
    }

    fn record(&self, history: &mut Vec<LogEvent>, event: LogEvent) {
        let show = match event.level {
            LogLevel::Debug => self.settings.log_skipped_files,
            _ => true,
        };
        if show && !self.quiet {
            println!("{}", event);
        }
        history.push(event);
    }

    fn draw(&self, view: &ViewState, elapsed_secs: u64) {
        if !self.draw_progress {
            return;
        }
        let line = ProgressLine {
            completed: view.completed,
            total: view.total,
            percentage: view.percentage,
            status: &view.status,
            elapsed_secs,
        };
        let width = progress_width(terminal::size().ok());
        let mut stderr = std::io::stderr();
        let _ = execute!(
            stderr,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line.render(width))
        );
        let _ = stderr.flush();
    }

    fn clear_progress(&self) {
        if self.draw_progress {
            let mut stderr = std::io::stderr();
            let _ = execute!(stderr, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        }
    }
}

/// Columns available to the progress line. The last column is left free so
/// the line never wraps.
fn progress_width(size: Option<(u16, u16)>) -> usize {
    size.map(|(cols, _)| (cols as usize).saturating_sub(1))
        .filter(|&w| w >= 20)
        .unwrap_or(80)
}

/// Process exit code for an outcome: 0 completed, 1 failed, 130 cancelled.
pub fn exit_code(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Completed => 0,
        Outcome::Failed(_) => 1,
        Outcome::Cancelled => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_width_from_terminal_size() {
        assert_eq!(progress_width(Some((120, 40))), 119);
        assert_eq!(progress_width(Some((21, 10))), 20);
        // Too narrow or unknown falls back
        assert_eq!(progress_width(Some((10, 5))), 80);
        assert_eq!(progress_width(None), 80);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&Outcome::Completed), 0);
        assert_eq!(exit_code(&Outcome::Failed("x".into())), 1);
        assert_eq!(exit_code(&Outcome::Cancelled), 130);
    }
}
