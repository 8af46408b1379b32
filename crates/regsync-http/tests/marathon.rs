use futures_util::StreamExt;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

use regsync_core::{EventStreamParser, SchedulerGateway, SyncError};
use regsync_http::{HttpConfig, MarathonClient};
use regsync_model::{AppId, Event, HealthCheckProtocol, TaskState};

fn web_api() -> serde_json::Value {
    json!({
        "id": "/web/api",
        "labels": { "urlprefix": "/api" },
        "healthChecks": [{
            "protocol": "HTTP",
            "path": "/health",
            "portIndex": 0,
            "intervalSeconds": 10,
            "timeoutSeconds": 5
        }],
        "tasks": [{
            "id": "t1",
            "appId": "/web/api",
            "host": "10.0.0.5",
            "ports": [31000],
            "state": "TASK_RUNNING"
        }]
    })
}

async fn client(server: &MockServer) -> MarathonClient {
    MarathonClient::new(&server.uri(), HttpConfig::default()).unwrap()
}

#[tokio::test]
async fn lists_applications_with_embedded_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .and(query_param("embed", "apps.tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "apps": [web_api()] })))
        .expect(1)
        .mount(&server)
        .await;

    let apps = client(&server).await.list_applications().await.unwrap();

    assert_eq!(apps.len(), 1);
    let app = &apps[0];
    assert_eq!(app.id, AppId::from("/web/api"));
    assert_eq!(app.labels.get("urlprefix"), Some("/api"));
    let hc = app.health_check().unwrap();
    assert_eq!(hc.protocol, HealthCheckProtocol::Http);
    assert_eq!(hc.path, "/health");
    assert_eq!(app.tasks.len(), 1);
    assert_eq!(app.tasks[0].state, TaskState::Running);
    assert_eq!(app.tasks[0].ports, vec![31000]);
}

#[tokio::test]
async fn fetches_single_application() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps/web/api"))
        .and(query_param("embed", "app.tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "app": web_api() })))
        .mount(&server)
        .await;

    let app = client(&server)
        .await
        .get_application(&AppId::from("/web/api"))
        .await
        .unwrap();
    assert_eq!(app.id.service_name(), "web.api");
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "App '/nope' does not exist" })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .get_application(&AppId::from("/nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFound(_)));
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .respond_with(ResponseTemplate::new(503).set_body_string("leader unknown"))
        .mount(&server)
        .await;

    let err = client(&server).await.list_applications().await.unwrap_err();
    match err {
        SyncError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "leader unknown");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn invalid_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).await.list_applications().await.unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)));
}

#[tokio::test]
async fn unreachable_scheduler_is_a_transport_error() {
    let client = MarathonClient::new("http://127.0.0.1:1", HttpConfig::default()).unwrap();
    let err = client.list_applications().await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
}

#[tokio::test]
async fn event_stream_is_requested_and_framed() {
    let server = MockServer::start().await;
    let body = concat!(
        "event: status_update_event\n",
        "data: {\"eventType\":\"status_update_event\",\"taskId\":\"t1\",\"appId\":\"/web/api\",\"host\":\"10.0.0.5\",\"ports\":[31000],\"taskStatus\":\"TASK_KILLED\"}\n",
        "\n",
        "event: deployment_info\n",
        "data: {\"eventType\":\"deployment_info\"}\n",
        "\n",
    );
    Mock::given(method("GET"))
        .and(path("/v2/events"))
        .and(query_param("event_type", "status_update_event"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client(&server).await.open_event_stream().await.unwrap();
    let events: Vec<_> = EventStreamParser::new(stream).into_stream().collect().await;

    assert_eq!(events.len(), 3);
    match &events[0] {
        Ok(Event::StatusUpdate(u)) => assert_eq!(u.task_status, TaskState::Killed),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(events[1], Ok(Event::Ignored)));
    assert!(matches!(events[2], Err(SyncError::StreamEnded)));
}

#[tokio::test]
async fn rejected_subscription_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/events"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let res = client(&server).await.open_event_stream().await;
    assert!(matches!(
        res,
        Err(SyncError::UnexpectedStatus { status: 403, .. })
    ));
}
