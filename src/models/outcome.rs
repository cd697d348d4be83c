use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::log::LogEvent;
use super::request::MirrorRequest;

/// Lifecycle of a mirror operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationState {
    Idle = 0,
    Scanning = 1,
    CreatingDirectories = 2,
    CreatingFiles = 3,
    Completed = 4,
    Cancelled = 5,
    Failed = 6,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Scanning,
            2 => Self::CreatingDirectories,
            3 => Self::CreatingFiles,
            4 => Self::Completed,
            5 => Self::Cancelled,
            6 => Self::Failed,
            _ => Self::Idle,
        }
    }

    /// Status line shown while the state is active.
    pub fn status_text(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Scanning => "Scanning...",
            Self::CreatingDirectories => "Creating directories...",
            Self::CreatingFiles => "Creating files...",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Error",
        }
    }
}

/// Terminal result of an operation. Reported exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Cancelled,
    Failed(String),
}

impl Outcome {
    pub fn state(&self) -> OperationState {
        match self {
            Self::Completed => OperationState::Completed,
            Self::Cancelled => OperationState::Cancelled,
            Self::Failed(_) => OperationState::Failed,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// What the caller gets back once the operation task ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSummary {
    pub outcome: Outcome,
    pub completed: usize,
    pub total: usize,
    pub elapsed_ms: u64,
}

/// Exportable record of a finished run: summary plus the log history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationReport {
    pub request: MirrorRequest,
    pub started_at: DateTime<Local>,
    pub summary: OperationSummary,
    pub log: Vec<LogEvent>,
}
