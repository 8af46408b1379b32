use serde::{Deserialize, Serialize};

use crate::{AppId, Application, Task, TaskId, TaskState};

/// Scheduler event, keyed on the `eventType` field of the pushed record.
///
/// Only the kinds the reconciliation engine reacts to are modelled; everything else decodes
/// to [`Event::Ignored`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum Event {
    /// An application definition was created or changed.
    #[serde(rename = "api_post_event")]
    ApplicationUpdated {
        #[serde(rename = "appDefinition")]
        app: Application,
    },
    /// A task reported a new lifecycle state.
    #[serde(rename = "status_update_event")]
    StatusUpdate(StatusUpdate),
    #[serde(other)]
    Ignored,
}

impl Event {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ApplicationUpdated { .. } => "application_updated",
            Event::StatusUpdate(_) => "status_update",
            Event::Ignored => "ignored",
        }
    }
}

/// Payload of a task status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub task_id: TaskId,
    pub app_id: AppId,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub ports: Vec<u16>,
    pub task_status: TaskState,
}

impl StatusUpdate {
    /// The task as described by this update.
    pub fn to_task(&self) -> Task {
        Task {
            id: self.task_id.clone(),
            app_id: self.app_id.clone(),
            host: self.host.clone(),
            ports: self.ports.clone(),
            state: self.task_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_update() {
        let json = r#"{
            "eventType": "status_update_event",
            "timestamp": "2017-05-04T10:00:00.000Z",
            "slaveId": "s1",
            "taskId": "t1",
            "taskStatus": "TASK_RUNNING",
            "appId": "/web/api",
            "host": "10.0.0.5",
            "ports": [31000],
            "version": "2017-05-04T09:59:00.000Z"
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();

        let Event::StatusUpdate(update) = event else {
            panic!("expected status update, got {event:?}");
        };
        assert_eq!(update.task_id, TaskId::from("t1"));
        assert_eq!(update.app_id, AppId::from("/web/api"));
        assert_eq!(update.task_status, TaskState::Running);

        let task = update.to_task();
        assert_eq!(task.host, "10.0.0.5");
        assert_eq!(task.ports, vec![31000]);
    }

    #[test]
    fn decodes_application_update() {
        let json = r#"{
            "eventType": "api_post_event",
            "clientIp": "10.0.0.1",
            "uri": "/v2/apps/web/api",
            "appDefinition": {
                "id": "/web/api",
                "healthChecks": [{"protocol": "HTTP", "path": "/health"}]
            }
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();

        let Event::ApplicationUpdated { app } = event else {
            panic!("expected application update, got {event:?}");
        };
        assert_eq!(app.id, AppId::from("/web/api"));
        assert!(app.health_check().is_some());
    }

    #[test]
    fn other_event_types_are_ignored() {
        let json = r#"{"eventType": "deployment_success", "id": "d-1"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event, Event::Ignored);
        assert_eq!(event.kind(), "ignored");
    }

    #[test]
    fn missing_event_type_is_an_error() {
        assert!(serde_json::from_str::<Event>(r#"{"taskId": "t1"}"#).is_err());
    }

    #[test]
    fn status_update_without_task_id_is_an_error() {
        let json = r#"{"eventType": "status_update_event", "appId": "/a", "taskStatus": "TASK_RUNNING"}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }
}
