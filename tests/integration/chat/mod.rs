//! Chat pipeline over HTTP

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use agentchat_conversations::SERVICE_UNAVAILABLE;
use agentchat_llm::MockLlmService;

use crate::common::{parse_body, request, test_user, TestApp};

#[tokio::test]
async fn test_send_message_starts_conversation() {
    let app = TestApp::new().await.unwrap();
    let (user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            Some(&jwt),
            Some(json!({ "message": "hello there" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["response"], "Mock response to: hello there");
    assert_eq!(body["model_used"], "mock-model");
    assert!(body["tokens_used"].is_u64());

    let conversation_id = body["conversation_id"].as_str().unwrap();
    let stored = app.store.conversation(conversation_id).await.unwrap();
    assert_eq!(stored.user_id, user_id);
    assert_eq!(stored.title, "hello there");
    assert_eq!(stored.message_count, 2);
}

#[tokio::test]
async fn test_follow_up_reuses_conversation() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();

    let first = parse_body(
        app.router()
            .oneshot(request(
                Method::POST,
                "/api/v1/chat/message",
                Some(&jwt),
                Some(json!({ "message": "first" })),
            ))
            .await
            .unwrap(),
    )
    .await;
    let conversation_id = first["conversation_id"].as_str().unwrap().to_string();

    let second = parse_body(
        app.router()
            .oneshot(request(
                Method::POST,
                "/api/v1/chat/message",
                Some(&jwt),
                Some(json!({ "message": "second", "conversation_id": conversation_id })),
            ))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(second["conversation_id"], conversation_id.as_str());
    let stored = app.store.conversation(&conversation_id).await.unwrap();
    assert_eq!(stored.message_count, 4);
}

#[tokio::test]
async fn test_unreachable_backend_degrades() {
    let app = TestApp::with_llm(MockLlmService::new().failing()).await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            Some(&jwt),
            Some(json!({ "message": "anyone home?" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = parse_body(resp).await;
    assert_eq!(body["response"], SERVICE_UNAVAILABLE);
    assert!(body["tokens_used"].is_null());

    let conversation_id = body["conversation_id"].as_str().unwrap();
    let stored = app.store.conversation(conversation_id).await.unwrap();
    assert_eq!(stored.message_count, 2);
}

#[tokio::test]
async fn test_store_outage_is_an_error() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();
    app.store.set_unavailable(true);

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            Some(&jwt),
            Some(json!({ "message": "hello" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.llm.generate_calls(), 0);
}

#[tokio::test]
async fn test_send_message_requires_token() {
    let app = TestApp::new().await.unwrap();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            None,
            Some(json!({ "message": "hello" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_and_oversized_messages_rejected() {
    let app = TestApp::new().await.unwrap();
    let (_user_id, jwt) = test_user();

    for message in [String::new(), "x".repeat(4001)] {
        let resp = app
            .router()
            .oneshot(request(
                Method::POST,
                "/api/v1/chat/message",
                Some(&jwt),
                Some(json!({ "message": message })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(app.llm.generate_calls(), 0);
}

#[tokio::test]
async fn test_models_snapshot_and_refresh() {
    let app = TestApp::with_llm(MockLlmService::new().with_models(["phi3:mini", "mistral:7b"]))
        .await
        .unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(Method::GET, "/api/v1/chat/models", None, None))
        .await
        .unwrap();
    let body = parse_body(resp).await;
    assert_eq!(body["available_models"], json!(["phi3:mini", "mistral:7b"]));
    assert_eq!(body["default_model"], "mistral:7b");

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/models/refresh",
            Some(&jwt),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_against_failing_backend_is_503() {
    let app = TestApp::with_llm(MockLlmService::new().failing()).await.unwrap();
    let (_user_id, jwt) = test_user();

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/models/refresh",
            Some(&jwt),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
