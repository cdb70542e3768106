//! Real-time delivery: named channels, a registry of live connections and
//! the WebSocket endpoints that feed it.

pub mod api;
pub mod channel;
pub mod connection;
pub mod error;
pub mod event;
pub mod registry;

pub use api::routes::routes;
pub use api::RealtimeState;
pub use channel::{Channel, UnknownChannel};
pub use connection::{outbound, Connection, Frame};
pub use error::{
    RegistryError, TransportError, CLOSE_INVALID_CHANNEL, CLOSE_NORMAL, CLOSE_TRY_AGAIN_LATER,
};
pub use event::Event;
pub use registry::ConnectionRegistry;
