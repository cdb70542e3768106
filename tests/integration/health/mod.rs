//! Liveness and connection status

use axum::http::{Method, StatusCode};
use tower::ServiceExt;

use crate::common::{parse_body, request, TestApp};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await.unwrap();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(parse_body(resp).await["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_counts_connections() {
    let app = TestApp::new().await.unwrap();
    let (tx, _rx) = agentchat_realtime::outbound(4);
    app.app.registry.connect(tx, "chat", None).await.unwrap();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/health/", None, None))
        .await
        .unwrap();
    let body = parse_body(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["websocket_connections"], 1);
}

#[tokio::test]
async fn test_status_counts_connections_per_channel() {
    let app = TestApp::new().await.unwrap();
    let mut receivers = Vec::new();
    for channel in ["chat", "chat", "notifications"] {
        let (tx, rx) = agentchat_realtime::outbound(4);
        app.app.registry.connect(tx, channel, None).await.unwrap();
        receivers.push(rx);
    }

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/health/status", None, None))
        .await
        .unwrap();
    let body = parse_body(resp).await;
    assert_eq!(body["websocket_channels"]["chat"], 2);
    assert_eq!(body["websocket_channels"]["data"], 0);
    assert_eq!(body["websocket_channels"]["notifications"], 1);
    assert_eq!(body["total_connections"], 3);
}
