use std::{net::SocketAddr, time::Duration};

use clap::{Parser, Subcommand};

use regsync_core::{
    DEFAULT_PREFIX_LABEL, DEFAULT_SENTINEL_TAG, DEFAULT_TAG_PREFIX, ReconnectPolicy, TaggerConfig,
};
use regsync_http::HttpConfig;
use regsync_model::AppId;
use regsync_observe::{LoggerConfig, LoggerFormat, LoggerLevel};

/// Mirror scheduler tasks into the service registry.
#[derive(Debug, Parser)]
#[command(name = "regsyncd", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Scheduler base URL.
    #[arg(
        long,
        global = true,
        env = "REGSYNC_SCHEDULER",
        default_value = "http://127.0.0.1:8080"
    )]
    pub scheduler: String,

    /// Registry agent base URL.
    #[arg(
        long,
        global = true,
        env = "REGSYNC_REGISTRY",
        default_value = "http://127.0.0.1:8500"
    )]
    pub registry: String,

    /// ACL token for registry requests.
    #[arg(long, global = true, env = "REGSYNC_REGISTRY_TOKEN", hide_env_values = true)]
    pub registry_token: Option<String>,

    /// Timeout in seconds for connection setup and every non-streaming request.
    #[arg(long, global = true, env = "REGSYNC_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Tag that marks registry entries owned by this process.
    #[arg(long, global = true, env = "REGSYNC_SENTINEL_TAG", default_value = DEFAULT_SENTINEL_TAG)]
    pub sentinel_tag: String,

    /// Application label key carrying routing prefixes.
    #[arg(long, global = true, env = "REGSYNC_PREFIX_LABEL", default_value = DEFAULT_PREFIX_LABEL)]
    pub prefix_label: String,

    /// Prefix of the tag emitted for each routing value.
    #[arg(long, global = true, env = "REGSYNC_TAG_PREFIX", default_value = DEFAULT_TAG_PREFIX)]
    pub tag_prefix: String,

    /// Log filter, e.g. `info` or `regsync_core=debug,info`.
    #[arg(long, global = true, env = "REGSYNC_LOG_LEVEL", default_value = "info")]
    pub log_level: LoggerLevel,

    /// Log output: text, json or journald.
    #[arg(long, global = true, env = "REGSYNC_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Restart with a full reconciliation when the event stream is lost.
    #[arg(long, env = "REGSYNC_RECONNECT")]
    pub reconnect: bool,

    /// First restart delay in milliseconds.
    #[arg(long, env = "REGSYNC_RECONNECT_FIRST_MS", default_value_t = 1_000)]
    pub reconnect_first_ms: u64,

    /// Upper bound of the restart delay in milliseconds.
    #[arg(long, env = "REGSYNC_RECONNECT_MAX_MS", default_value_t = 60_000)]
    pub reconnect_max_ms: u64,

    /// Randomise restart delays.
    #[arg(long, env = "REGSYNC_RECONNECT_JITTER")]
    pub reconnect_jitter: bool,

    /// Serve prometheus metrics on this address under `/metrics`.
    #[arg(long, env = "REGSYNC_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Reconcile, then follow scheduler events (default).
    #[default]
    Run,
    /// Print the startup reconciliation plan without applying it.
    Plan,
    /// Print the records one application would produce.
    Inspect {
        /// Application identifier, e.g. `/web/api`.
        app: AppId,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..Default::default()
        }
    }

    pub fn tagger_config(&self) -> TaggerConfig {
        TaggerConfig {
            sentinel: self.sentinel_tag.clone(),
            prefix_label: self.prefix_label.clone(),
            tag_prefix: self.tag_prefix.clone(),
        }
    }

    pub fn scheduler_http(&self) -> HttpConfig {
        HttpConfig::default().with_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn registry_http(&self) -> HttpConfig {
        let cfg = self.scheduler_http();
        match &self.registry_token {
            Some(token) => cfg.with_token(token.as_str()),
            None => cfg,
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            enabled: self.reconnect,
            first_ms: self.reconnect_first_ms,
            max_ms: self.reconnect_max_ms,
            jitter: self.reconnect_jitter,
            ..Default::default()
        }
    }
}
