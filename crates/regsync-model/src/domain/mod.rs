mod ids;
pub use ids::{AppId, TaskId};

mod labels;
pub use labels::Labels;

mod health;
pub use health::{HealthCheckProtocol, HealthCheckSpec};

mod task;
pub use task::{Task, TaskState};

mod app;
pub use app::{AppEnvelope, AppList, Application};
