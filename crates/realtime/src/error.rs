//! Registry errors

use crate::channel::UnknownChannel;

/// Close code sent when a client asks for a channel that does not exist
pub const CLOSE_INVALID_CHANNEL: u16 = 4000;
/// Normal closure
pub const CLOSE_NORMAL: u16 = 1000;
/// Sent to a client dropped for not keeping up with its outbound queue
pub const CLOSE_TRY_AGAIN_LATER: u16 = 1013;

/// Send failure on a single connection. Never escapes a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("outbound queue full")]
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    UnknownChannel(UnknownChannel),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<UnknownChannel> for RegistryError {
    fn from(err: UnknownChannel) -> Self {
        RegistryError::UnknownChannel(err)
    }
}
