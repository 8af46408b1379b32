use serde::{Deserialize, Serialize};

use crate::{AppId, TaskId};

/// Lifecycle state reported by the scheduler for a task.
///
/// The scheduler drives transitions; this type only classifies what was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskState {
    #[serde(rename = "TASK_STAGING")]
    Staging,
    #[serde(rename = "TASK_STARTING")]
    Starting,
    #[serde(rename = "TASK_RUNNING")]
    Running,
    #[serde(rename = "TASK_FINISHED")]
    Finished,
    #[serde(rename = "TASK_FAILED")]
    Failed,
    /// Only reported when the scheduler has the task-killing feature enabled.
    #[serde(rename = "TASK_KILLING")]
    Killing,
    #[serde(rename = "TASK_KILLED")]
    Killed,
    #[serde(rename = "TASK_LOST")]
    Lost,
    #[serde(rename = "TASK_ERROR")]
    Error,
    #[serde(rename = "TASK_DROPPED")]
    Dropped,
    #[serde(rename = "TASK_GONE")]
    Gone,
    #[serde(rename = "TASK_GONE_BY_OPERATOR")]
    GoneByOperator,
    /// The agent is unreachable; the task may still come back.
    #[serde(rename = "TASK_UNREACHABLE")]
    Unreachable,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TaskState {
    /// Staging/starting: the task exists but serves nothing yet.
    pub fn is_transient(&self) -> bool {
        matches!(self, TaskState::Staging | TaskState::Starting)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }

    /// Returns `true` if the task will never serve traffic again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished
                | TaskState::Failed
                | TaskState::Killing
                | TaskState::Killed
                | TaskState::Lost
                | TaskState::Error
                | TaskState::Dropped
                | TaskState::Gone
                | TaskState::GoneByOperator
        )
    }

    /// Wire name as reported by the scheduler.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Staging => "TASK_STAGING",
            TaskState::Starting => "TASK_STARTING",
            TaskState::Running => "TASK_RUNNING",
            TaskState::Finished => "TASK_FINISHED",
            TaskState::Failed => "TASK_FAILED",
            TaskState::Killing => "TASK_KILLING",
            TaskState::Killed => "TASK_KILLED",
            TaskState::Lost => "TASK_LOST",
            TaskState::Error => "TASK_ERROR",
            TaskState::Dropped => "TASK_DROPPED",
            TaskState::Gone => "TASK_GONE",
            TaskState::GoneByOperator => "TASK_GONE_BY_OPERATOR",
            TaskState::Unreachable => "TASK_UNREACHABLE",
            TaskState::Unknown => "TASK_UNKNOWN",
        }
    }
}

/// One scheduled instance of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Owning application. Embedded task listings always carry it.
    pub app_id: AppId,
    #[serde(default)]
    pub host: String,
    /// Allocated host ports, in declaration order.
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub state: TaskState,
}
