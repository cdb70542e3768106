//! Live WebSocket integration tests
//!
//! Serves the composed application on an ephemeral port and talks to it with
//! a real WebSocket client.

#![allow(dead_code)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use agentchat_realtime::{Channel, CLOSE_INVALID_CHANNEL};

use common::{parse_body, request, test_user, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn serve(app: &TestApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{}{}", addr, path)).await.unwrap();
    ws
}

/// Next text frame parsed as JSON
async fn next_event(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Wait until the registry reports `expected` connections on `channel`
async fn wait_for_count(app: &TestApp, channel: Channel, expected: usize) {
    timeout(WAIT, async {
        while app.app.registry.count(Some(channel)).await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry never reached the expected count");
}

#[tokio::test]
async fn test_first_frame_is_connection_ack() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;

    let mut ws = connect(addr, "/ws/data").await;
    let ack = next_event(&mut ws).await;

    assert_eq!(ack["type"], "connection");
    assert_eq!(ack["data"], json!({ "status": "connected", "channel": "data" }));
    assert!(ack["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_channel_is_closed_with_4000() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;

    let mut ws = connect(addr, "/ws/bogus").await;
    let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();

    match msg {
        Message::Close(Some(frame)) => {
            assert_eq!(u16::from(frame.code), CLOSE_INVALID_CHANNEL);
        }
        other => panic!("expected close frame, got {:?}", other),
    }
    assert_eq!(app.app.registry.count(None).await, 0);
}

#[tokio::test]
async fn test_chat_reply_is_pushed_to_subscribers() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;
    let (user_id, jwt) = test_user();

    let mut ws = connect(addr, &format!("/ws/chat?token={}", jwt)).await;
    assert_eq!(next_event(&mut ws).await["type"], "connection");
    wait_for_count(&app, Channel::Chat, 1).await;
    assert!(app.app.registry.user_connection(&user_id).await.is_some());

    let resp = app
        .router()
        .oneshot(request(
            Method::POST,
            "/api/v1/chat/message",
            Some(&jwt),
            Some(json!({ "message": "over the wire" })),
        ))
        .await
        .unwrap();
    let reply = parse_body(resp).await;

    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "chat_message");
    assert_eq!(event["data"]["conversation_id"], reply["conversation_id"]);
    assert_eq!(event["data"]["message"], reply["response"]);
    assert_eq!(event["data"]["user_id"], user_id.as_str());
}

#[tokio::test]
async fn test_inbound_chat_is_relayed_to_channel() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;

    let mut sender = connect(addr, "/ws/chat").await;
    let mut listener = connect(addr, "/ws/chat").await;
    next_event(&mut sender).await;
    next_event(&mut listener).await;
    wait_for_count(&app, Channel::Chat, 2).await;

    sender.send(Message::Text("hi all".into())).await.unwrap();

    let event = next_event(&mut listener).await;
    assert_eq!(event["type"], "message");
    assert_eq!(event["data"], json!({ "text": "hi all" }));
}

#[tokio::test]
async fn test_closing_client_leaves_registry() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;

    let mut ws = connect(addr, "/ws/notifications").await;
    next_event(&mut ws).await;
    wait_for_count(&app, Channel::Notifications, 1).await;

    ws.close(None).await.unwrap();
    wait_for_count(&app, Channel::Notifications, 0).await;
}

#[tokio::test]
async fn test_close_all_sends_normal_close() {
    let app = TestApp::new().await.unwrap();
    let addr = serve(&app).await;

    let mut ws = connect(addr, "/ws/chat").await;
    next_event(&mut ws).await;
    wait_for_count(&app, Channel::Chat, 1).await;

    assert_eq!(app.app.registry.close_all().await, 1);

    let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
    match msg {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1000),
        other => panic!("expected close frame, got {:?}", other),
    }
    assert_eq!(app.app.registry.count(None).await, 0);
}
