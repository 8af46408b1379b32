mod domain;
pub use domain::{
    AppEnvelope, AppId, AppList, Application, HealthCheckProtocol, HealthCheckSpec, Labels, Task,
    TaskId, TaskState,
};

mod error;
pub use error::{ModelError, ModelResult};

mod event;
pub use event::{Event, StatusUpdate};

mod registry;
pub use registry::{HealthCheckDescriptor, ServiceRecord, format_seconds};
