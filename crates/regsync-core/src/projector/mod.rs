use regsync_model::{Application, HealthCheckDescriptor, HealthCheckSpec, ServiceRecord, Task};

use crate::{
    error::{SyncError, SyncResult},
    tagger::ServiceTagger,
};

/// Maps a running task to the registry record that advertises it.
///
/// Pure: no I/O, no state beyond the tagging rules.
#[derive(Debug, Clone, Default)]
pub struct TaskProjector {
    tagger: ServiceTagger,
}

impl TaskProjector {
    pub fn new(tagger: ServiceTagger) -> Self {
        Self { tagger }
    }

    #[inline]
    pub fn tagger(&self) -> &ServiceTagger {
        &self.tagger
    }

    /// Build the record for `task` owned by `app`.
    ///
    /// Fails with [`SyncError::MalformedTask`] when the task has no ports, or when the resolved
    /// health check points at a port index the task does not have.
    pub fn project(
        &self,
        task: &Task,
        app: &Application,
        health_check: Option<&HealthCheckSpec>,
    ) -> SyncResult<ServiceRecord> {
        let Some(&port) = task.ports.first() else {
            return Err(SyncError::MalformedTask {
                task: task.id.clone(),
                reason: "no allocated ports",
            });
        };

        let check = match health_check {
            Some(hc) => Some(describe(task, hc)?),
            None => None,
        };

        Ok(ServiceRecord {
            id: task.id.clone(),
            name: app.id.service_name(),
            tags: self.tagger.tag(app),
            address: task.host.clone(),
            port,
            check,
        })
    }
}

fn describe(task: &Task, hc: &HealthCheckSpec) -> SyncResult<HealthCheckDescriptor> {
    let port = task
        .ports
        .get(hc.port_index)
        .ok_or_else(|| SyncError::MalformedTask {
            task: task.id.clone(),
            reason: "health check port index out of range",
        })?;

    let url = format!("http://{}:{}{}", task.host, port, hc.path);
    Ok(HealthCheckDescriptor::new(
        url,
        hc.interval_seconds,
        hc.timeout_seconds,
    ))
}
