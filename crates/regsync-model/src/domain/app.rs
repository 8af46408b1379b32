use serde::{Deserialize, Serialize};

use crate::{AppId, HealthCheckSpec, Labels, Task};

/// Application definition as owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: AppId,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub health_checks: Vec<HealthCheckSpec>,
    /// Only present when the listing embeds tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<Task>,
}

impl Application {
    pub fn new(id: impl Into<AppId>) -> Self {
        Self {
            id: id.into(),
            labels: Labels::new(),
            health_checks: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key, value);
        self
    }

    pub fn with_health_check(mut self, hc: HealthCheckSpec) -> Self {
        self.health_checks.push(hc);
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// The first HTTP-family health check, if any.
    ///
    /// Applications without one are not eligible for registry-backed health checking.
    pub fn health_check(&self) -> Option<&HealthCheckSpec> {
        self.health_checks
            .iter()
            .find(|hc| hc.protocol.is_http_family())
    }
}

/// Envelope of the scheduler's application listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<Application>,
}

/// Envelope of the scheduler's single-application response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEnvelope {
    pub app: Application,
}
