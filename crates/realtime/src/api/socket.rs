//! WebSocket upgrade handler and per-connection loops

use std::future::Future;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::IntoResponse,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::middleware::RealtimeState;
use crate::channel::Channel;
use crate::connection::{outbound, Connection, Frame};
use crate::error::CLOSE_TRY_AGAIN_LATER;
use crate::event::Event;

/// Query parameters for the WebSocket handshake
#[derive(Debug, Default, Deserialize)]
pub struct WsConnectParams {
    pub token: Option<String>,
}

/// GET /ws/{channel}?token=...
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(channel): Path<String>,
    Query(params): Query<WsConnectParams>,
    State(state): State<RealtimeState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, channel, params.token))
}

async fn handle_socket(
    socket: WebSocket,
    state: RealtimeState,
    channel: String,
    token: Option<String>,
) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = outbound(state.send_buffer);

    let connection = match state.registry.connect(tx, &channel, token.as_deref()).await {
        Ok(connection) => connection,
        Err(e) => {
            debug!(channel = %channel, error = %e, "WebSocket handshake rejected");
            // Flush the queued close frame
            write_frames(sink, rx, std::future::pending()).await;
            return;
        }
    };

    let writer = tokio::spawn(write_frames(sink, rx, connection.evicted()));
    let evicted = connection.evicted();
    tokio::pin!(evicted);

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => relay(&state, &connection, text.as_str()).await,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut evicted => {
                debug!(connection_id = %connection.id(), "Connection evicted by registry");
                break;
            }
        }
    }

    state.registry.disconnect(&connection).await;
    if connection.is_evicted() {
        // The writer sends its own close frame and exits
        let _ = writer.await;
    } else {
        writer.abort();
    }
}

/// Forward queued frames to the socket until the queue closes, a close frame
/// goes out, or `evicted` resolves
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Frame>,
    evicted: impl Future<Output = ()>,
) {
    tokio::pin!(evicted);

    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut evicted => Frame::close(CLOSE_TRY_AGAIN_LATER, "outbound queue overflow"),
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let (message, closing) = match frame {
            Frame::Text(text) => (Message::Text(text.into()), false),
            Frame::Close { code, reason } => (
                Message::Close(Some(CloseFrame {
                    code,
                    reason: reason.into(),
                })),
                true,
            ),
        };

        if sink.send(message).await.is_err() || closing {
            break;
        }
    }
}

/// Re-broadcast inbound client text according to the channel's role
async fn relay(state: &RealtimeState, connection: &Connection, text: &str) {
    let channel = connection.channel();
    match channel {
        Channel::Chat | Channel::Data => {
            let event = Event::inbound(channel, text, connection.user_id().map(str::to_string));
            state.registry.broadcast(&event, channel).await;
        }
        Channel::Notifications => {
            debug!(connection_id = %connection.id(), "Ignoring inbound frame on notifications");
        }
    }
}
