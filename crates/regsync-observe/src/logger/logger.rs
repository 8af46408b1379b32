use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::logger::{
    config::LoggerConfig,
    error::{LoggerError, LoggerResult},
    object::UtcRfc3339,
};

pub fn logger_text(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .with_ansi(cfg.should_use_color())
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);

    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

pub fn logger_json(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(cfg.with_targets)
        .with_timer(UtcRfc3339);

    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

#[cfg(target_os = "linux")]
pub fn logger_journald(cfg: &LoggerConfig) -> LoggerResult<()> {
    let layer =
        tracing_journald::layer().map_err(|e| LoggerError::JournaldInitFailed(e.to_string()))?;

    install(
        tracing_subscriber::registry()
            .with(cfg.level.to_env_filter())
            .with(layer),
    )
}

#[cfg(not(target_os = "linux"))]
pub fn logger_journald(_cfg: &LoggerConfig) -> LoggerResult<()> {
    Err(LoggerError::JournaldNotSupported)
}

fn install<S>(subscriber: S) -> LoggerResult<()>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::object::LoggerFormat;

    // The global subscriber can be set once per test binary, so only this test installs one.
    #[test]
    fn second_install_is_rejected() {
        let cfg = LoggerConfig {
            format: LoggerFormat::Json,
            use_color: false,
            ..Default::default()
        };

        assert!(logger_json(&cfg).is_ok());
        assert!(matches!(
            logger_text(&cfg),
            Err(LoggerError::AlreadyInitialized)
        ));
    }

    #[test]
    #[cfg(not(target_os = "linux"))]
    fn journald_is_unavailable_off_linux() {
        assert!(matches!(
            logger_journald(&LoggerConfig::default()),
            Err(LoggerError::JournaldNotSupported)
        ));
    }
}
