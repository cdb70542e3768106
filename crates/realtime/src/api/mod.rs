//! Real-time API layer: WebSocket endpoints over the connection registry

pub mod middleware;
pub mod routes;
pub mod socket;

pub use middleware::RealtimeState;
