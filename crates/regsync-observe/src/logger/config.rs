use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::object::{LoggerFormat, LoggerLevel};

/// Logger settings. Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter expression, e.g. `info` or `regsync_core=debug,info`.
    pub level: LoggerLevel,
    /// Print the module path of each event.
    pub with_targets: bool,
    /// Colorize text output; only honoured when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}
