//! Route definitions for the real-time API

use axum::{routing::get, Router};

use super::middleware::RealtimeState;
use super::socket;

/// `/ws/{channel}` upgrade endpoint
pub fn routes() -> Router<RealtimeState> {
    Router::new().route("/ws/{channel}", get(socket::ws_handler))
}
