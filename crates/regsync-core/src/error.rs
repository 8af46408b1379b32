use thiserror::Error;

use regsync_model::TaskId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed task {task}: {reason}")]
    MalformedTask { task: TaskId, reason: &'static str },

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("event stream ended")]
    StreamEnded,
}

impl SyncError {
    /// Short category label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => "transport",
            SyncError::Decode(_) => "decode",
            SyncError::NotFound(_) => "not_found",
            SyncError::MalformedTask { .. } => "malformed_task",
            SyncError::UnexpectedStatus { .. } => "status",
            SyncError::StreamEnded => "stream_ended",
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Why an engine run ended.
#[derive(Debug, Error)]
pub enum RunError {
    /// Inventory fetch or registry listing failed before the event loop started.
    #[error("startup reconciliation failed: {0}")]
    Startup(#[source] SyncError),

    /// The event stream failed before delivering a single event.
    #[error("event stream unavailable: {0}")]
    Subscribe(#[source] SyncError),

    /// The event stream terminated after delivering events.
    #[error("event stream terminated: {0}")]
    Stream(#[source] SyncError),
}
