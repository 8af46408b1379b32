use serde::{Deserialize, Serialize};

use crate::TaskId;

/// Registry entry for one running task.
///
/// `id` equals the task identifier, so dedup and deregistration are exact matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: TaskId,
    pub name: String,
    /// Ordered set: sentinel tag first, routing tags after.
    pub tags: Vec<String>,
    pub address: String,
    /// First allocated port of the task.
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<HealthCheckDescriptor>,
}

impl ServiceRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// HTTP health check the registry runs against the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckDescriptor {
    /// `http://{host}:{port}{path}`.
    pub url: String,
    /// Integer seconds with unit suffix, e.g. `10s`.
    pub interval: String,
    pub timeout: String,
}

impl HealthCheckDescriptor {
    pub fn new(url: impl Into<String>, interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            interval: format_seconds(interval_secs),
            timeout: format_seconds(timeout_secs),
        }
    }
}

/// Render a duration in whole seconds the way the registry expects it.
#[inline]
pub fn format_seconds(secs: u64) -> String {
    format!("{secs}s")
}
