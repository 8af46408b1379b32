mod format;
mod level;
mod timer;

pub use format::LoggerFormat;
pub use level::LoggerLevel;
pub use timer::UtcRfc3339;
