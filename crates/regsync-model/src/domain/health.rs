use serde::{Deserialize, Serialize};

/// Health check protocol declared on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthCheckProtocol {
    #[default]
    Http,
    Https,
    MesosHttp,
    MesosHttps,
    Tcp,
    MesosTcp,
    Command,
    #[serde(other)]
    Other,
}

impl HealthCheckProtocol {
    /// Returns `true` for protocols the registry can probe with an HTTP check.
    pub fn is_http_family(&self) -> bool {
        matches!(
            self,
            HealthCheckProtocol::Http
                | HealthCheckProtocol::Https
                | HealthCheckProtocol::MesosHttp
                | HealthCheckProtocol::MesosHttps
        )
    }
}

/// One health check declared on an application.
///
/// Missing fields take the scheduler's own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSpec {
    #[serde(default)]
    pub protocol: HealthCheckProtocol,
    #[serde(default = "default_path")]
    pub path: String,
    /// Index into the owning task's port list.
    #[serde(default)]
    pub port_index: usize,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Delay before failures start counting.
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: u64,
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for HealthCheckSpec {
    fn default() -> Self {
        Self {
            protocol: HealthCheckProtocol::default(),
            path: default_path(),
            port_index: 0,
            interval_seconds: default_interval(),
            timeout_seconds: default_timeout(),
            grace_period_seconds: default_grace_period(),
            max_consecutive_failures: default_max_failures(),
        }
    }
}

fn default_path() -> String {
    "/".to_string()
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    20
}

fn default_grace_period() -> u64 {
    300
}

fn default_max_failures() -> u32 {
    3
}
