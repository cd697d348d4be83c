use tokio::sync::mpsc;

use crate::models::log::LogEvent;
use crate::models::outcome::{OperationState, Outcome};

#[derive(Debug, Clone)]
pub enum Event {
    // Operation history
    Log(LogEvent),

    // Progress
    Progress {
        completed: usize,
        total: usize,
        percentage: u8,
        status_text: String,
    },

    // Operation state
    StateChanged { state: OperationState },
    Finished { outcome: Outcome, elapsed_ms: u64 },
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send a log event and mirror it to tracing. A closed channel is ignored.
pub fn emit_log(tx: &EventSender, event: LogEvent) {
    use crate::models::log::LogLevel;

    match event.level {
        LogLevel::Debug => tracing::debug!("{}", event.message),
        LogLevel::Info => tracing::info!("{}", event.message),
        LogLevel::Warn => tracing::warn!("{}", event.message),
        LogLevel::Error => tracing::error!("{}", event.message),
    }
    let _ = tx.send(Event::Log(event));
}
