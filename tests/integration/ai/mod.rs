//! Direct generation backend endpoints

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use agentchat_llm::MockLlmService;

use crate::common::{parse_body, request, test_user, TestApp};

#[tokio::test]
async fn test_health_reports_models() {
    let app = TestApp::new().await.unwrap();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/ai/health", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models"], json!(["mock-model"]));
    assert_eq!(body["base_url"], "mock://");
}

#[tokio::test]
async fn test_health_reports_backend_error_without_failing() {
    let app = TestApp::with_llm(MockLlmService::new().failing()).await.unwrap();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/ai/health", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_list_models() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/ai/models", Some(&jwt), None))
        .await
        .unwrap();
    let body = parse_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["models"][0]["name"], "mock-model");
}

#[tokio::test]
async fn test_generate_uses_default_model() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/ai/generate",
            Some(&jwt),
            Some(json!({ "prompt": "fn main" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Mock response to: fn main");
    assert_eq!(body["model"], "mock-model");
    assert_eq!(body["prompt_length"], 7);
}

#[tokio::test]
async fn test_generate_failure_is_503() {
    let app = TestApp::with_llm(MockLlmService::new().failing()).await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/ai/generate",
            Some(&jwt),
            Some(json!({ "prompt": "hello", "model": "mock-model" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_pull_model() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/ai/pull-model",
            Some(&jwt),
            Some(json!({ "model_name": "mistral:7b" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["model"], "mistral:7b");
}
