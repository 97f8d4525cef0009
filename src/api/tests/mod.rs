use super::*;
use crate::test_helpers::{RecordingAudit, RecordingNotifier, harness, harness_with, payload};
use crate::validation::test_archives::zip_with;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt; // for oneshot()
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn post_event(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/events")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let app = create_router(Arc::new(h.pipeline));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn event_runs_pipeline_and_returns_200() {
    let h = harness();
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sub42.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_with(&[("a.txt", b"a")])))
        .mount(&mock_server)
        .await;

    let notifier = h.notifier.clone();
    let app = create_router(Arc::new(h.pipeline));

    let url = format!("{}/sub42.zip", mock_server.uri());
    let response = app
        .oneshot(post_event(payload("sub42", "a@b.com", &url)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        body_string(response).await,
        "\"Email sent and tracking completed\""
    );
    assert_eq!(
        notifier.sent()[0].1,
        "Submission file upload successfully: submissions/sub42.zip"
    );
}

#[tokio::test]
async fn malformed_event_returns_500() {
    let h = harness();
    let app = create_router(Arc::new(h.pipeline));

    let response = app
        .oneshot(post_event(br#"{"Records":[{"Sns":{"Message":"{}"}}]}"#.to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "\"Internal Server Error\"");
    assert!(h.notifier.sent().is_empty());
    assert!(h.audit.records().is_empty());
}

#[tokio::test]
async fn reporting_failure_returns_500() {
    let h = harness_with(RecordingNotifier::failing(), RecordingAudit::default());
    let app = create_router(Arc::new(h.pipeline));

    // Unreachable artifact: intake failure is contained, notify then fails
    let response = app
        .oneshot(post_event(payload(
            "sub9",
            "a@b.com",
            "http://127.0.0.1:1/sub9.zip",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(h.audit.records().is_empty());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let h = harness();
    let app = create_router(Arc::new(h.pipeline));

    let request = Request::builder()
        .uri("/downloads")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_stops_on_shutdown_signal() {
    let h = harness();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(start_api_server(
        Arc::new(h.pipeline),
        "127.0.0.1:0".parse().unwrap(),
        async move {
            rx.await.ok();
        },
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
