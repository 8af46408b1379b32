use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format: {0} (expected: text|json|journald)")]
    InvalidFormat(String),

    #[error("journald output is only available on linux")]
    JournaldNotSupported,

    #[error("journald connection failed: {0}")]
    JournaldInitFailed(String),

    #[error("global logger already installed")]
    AlreadyInitialized,

    #[error("invalid log filter: {0}")]
    InvalidLevel(String),
}

pub type LoggerResult<T> = Result<T, LoggerError>;
