mod config;
mod error;
mod logger;
mod object;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel};

/// Install the global tracing subscriber described by `cfg`.
///
/// Can succeed only once per process; later calls return [`LoggerError::AlreadyInitialized`].
///
/// ```rust
/// use regsync_observe::{LoggerConfig, init_logger};
///
/// init_logger(&LoggerConfig::default()).expect("logger");
/// tracing::info!("ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => logger::logger_text(cfg),
        LoggerFormat::Json => logger::logger_json(cfg),
        LoggerFormat::Journald => logger::logger_journald(cfg),
    }
}
