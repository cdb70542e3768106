//! Conversation management over HTTP

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::{parse_body, request, test_user, TestApp};

/// Send one chat message and return the conversation id
async fn start_conversation(app: &TestApp, jwt: &str, message: &str) -> String {
    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            Some(jwt),
            Some(json!({ "message": message })),
        ))
        .await
        .unwrap();
    let body = parse_body(resp).await;
    body["conversation_id"].as_str().unwrap().to_string()
}

async fn send(app: &TestApp, method: Method, uri: &str, jwt: &str, body: Option<Value>) -> (StatusCode, Value) {
    let resp = app
        .router()
        .oneshot(request(method, uri, Some(jwt), body))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_list {
    use super::*;

    #[tokio::test]
    async fn test_lists_only_own_active_conversations() {
        let app = TestApp::new().await.unwrap();
        let (_alice, alice_jwt) = test_user();
        let (_bob, bob_jwt) = test_user();

        let kept = start_conversation(&app, &alice_jwt, "kept").await;
        let dropped = start_conversation(&app, &alice_jwt, "dropped").await;
        start_conversation(&app, &bob_jwt, "not alice's").await;

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", dropped),
            &alice_jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/api/v1/chat/conversations", &alice_jwt, None).await;
        assert_eq!(status, StatusCode::OK);

        let conversations = body["conversations"].as_array().unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0]["id"], kept.as_str());
        assert_eq!(conversations[0]["message_count"], 2);
    }
}

mod test_history {
    use super::*;

    #[tokio::test]
    async fn test_history_is_ordered_and_paginated() {
        let app = TestApp::new().await.unwrap();
        let (user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "ping").await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/chat/conversations/{}/history", id),
            &jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["conversation_id"], id.as_str());
        assert_eq!(body["total_messages"], 2);
        assert_eq!(body["has_more"], false);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "ping");
        assert_eq!(messages[0]["user_id"], user_id.as_str());
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Mock response to: ping");

        let (_, page) = send(
            &app,
            Method::GET,
            &format!("/api/v1/chat/conversations/{}/history?offset=0&limit=1", id),
            &jwt,
            None,
        )
        .await;
        assert_eq!(page["messages"].as_array().unwrap().len(), 1);
        assert_eq!(page["has_more"], true);
    }

    #[tokio::test]
    async fn test_history_of_foreign_conversation_is_404() {
        let app = TestApp::new().await.unwrap();
        let (_alice, alice_jwt) = test_user();
        let (_bob, bob_jwt) = test_user();
        let id = start_conversation(&app, &alice_jwt, "private").await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/chat/conversations/{}/history", id),
            &bob_jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

mod test_delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_soft_deletes_and_zeroes_count() {
        let app = TestApp::new().await.unwrap();
        let (_user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "to delete").await;

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", id),
            &jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Conversation deleted successfully");

        let row = app.store.conversation(&id).await.unwrap();
        assert!(!row.is_active);
        assert_eq!(row.message_count, 0);
        assert!(app.store.all_messages(&id).await.iter().all(|m| !m.is_active));

        // Deleting again is declined
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", id),
            &jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_by_other_user_is_404() {
        let app = TestApp::new().await.unwrap();
        let (_alice, alice_jwt) = test_user();
        let (_bob, bob_jwt) = test_user();
        let id = start_conversation(&app, &alice_jwt, "mine").await;

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", id),
            &bob_jwt,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(app.store.conversation(&id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_message_to_deleted_conversation_starts_new_one() {
        let app = TestApp::new().await.unwrap();
        let (_user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "old").await;
        send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", id),
            &jwt,
            None,
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/chat/message",
            &jwt,
            Some(json!({ "message": "again", "conversation_id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(body["conversation_id"], id.as_str());
    }
}

mod test_rename {
    use super::*;

    #[tokio::test]
    async fn test_rename_updates_title() {
        let app = TestApp::new().await.unwrap();
        let (_user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "untitled").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/chat/conversations/{}/rename", id),
            &jwt,
            Some(json!({ "new_title": "Renamed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Conversation renamed successfully");
        assert_eq!(app.store.conversation(&id).await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_rename_deleted_conversation_is_404() {
        let app = TestApp::new().await.unwrap();
        let (_user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "short lived").await;
        send(
            &app,
            Method::DELETE,
            &format!("/api/v1/chat/conversations/{}", id),
            &jwt,
            None,
        )
        .await;

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/chat/conversations/{}/rename", id),
            &jwt,
            Some(json!({ "new_title": "Too late" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(app.store.conversation(&id).await.unwrap().title, "short lived");
    }

    #[tokio::test]
    async fn test_rename_rejects_bad_titles() {
        let app = TestApp::new().await.unwrap();
        let (_user_id, jwt) = test_user();
        let id = start_conversation(&app, &jwt, "title").await;

        for title in [String::new(), "t".repeat(201)] {
            let (status, _) = send(
                &app,
                Method::PUT,
                &format!("/api/v1/chat/conversations/{}/rename", id),
                &jwt,
                Some(json!({ "new_title": title })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
}
