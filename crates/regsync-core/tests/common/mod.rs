pub mod fakes;

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

use regsync_model::{
    Application, HealthCheckProtocol, HealthCheckSpec, Task, TaskId, TaskState,
};

static INIT: Once = Once::new();

/// Initialise tracing for tests; output is only shown for failing tests.
///
/// `RUST_LOG=debug cargo test` raises the level.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

pub fn http_check(path: &str) -> HealthCheckSpec {
    HealthCheckSpec {
        protocol: HealthCheckProtocol::Http,
        path: path.into(),
        interval_seconds: 10,
        timeout_seconds: 5,
        ..Default::default()
    }
}

pub fn task(id: &str, app: &str, state: TaskState, ports: &[u16]) -> Task {
    Task {
        id: TaskId::from(id),
        app_id: app.into(),
        host: "10.0.0.5".into(),
        ports: ports.to_vec(),
        state,
    }
}

/// `/web/api` with an HTTP health check on `/health`.
pub fn web_api() -> Application {
    Application::new("/web/api").with_health_check(http_check("/health"))
}

/// A `data:` frame for a task status change of `/web/api`.
pub fn status_frame(task: &str, state: &str, ports: &[u16]) -> String {
    let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
    format!(
        "data: {{\"eventType\":\"status_update_event\",\"taskId\":\"{task}\",\"appId\":\"/web/api\",\"host\":\"10.0.0.5\",\"ports\":[{}],\"taskStatus\":\"{state}\"}}\n\n",
        ports.join(",")
    )
}
