//! A live client endpoint as seen by the registry
//!
//! The registry never touches a socket. Each connection owns the sending half
//! of a bounded queue; a writer task drains the other half into the transport.
//! Enqueueing is non-blocking, so registry locks never span I/O, and frames
//! reach any one client in the order they were enqueued.
//!
//! A connection the registry drops is marked evicted; its writer task watches
//! that flag so the client is closed even when the queue is stuck full.

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::channel::Channel;
use crate::error::TransportError;

/// Outbound unit handed to a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

impl Frame {
    pub fn close(code: u16, reason: impl Into<String>) -> Self {
        Frame::Close {
            code,
            reason: reason.into(),
        }
    }
}

/// Create the queue backing one connection
pub fn outbound(capacity: usize) -> (mpsc::Sender<Frame>, mpsc::Receiver<Frame>) {
    mpsc::channel(capacity.max(1))
}

#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    channel: Channel,
    user_id: Option<String>,
    sender: mpsc::Sender<Frame>,
    evicted: watch::Sender<bool>,
}

impl Connection {
    pub(crate) fn new(channel: Channel, user_id: Option<String>, sender: mpsc::Sender<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            user_id,
            sender,
            evicted: watch::Sender::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Enqueue a frame without waiting
    pub fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    pub fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.send(Frame::Text(text))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn evict(&self) {
        self.evicted.send_replace(true);
    }

    pub fn is_evicted(&self) -> bool {
        *self.evicted.borrow()
    }

    /// Resolves once the registry has dropped this connection
    pub fn evicted(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.evicted.subscribe();
        async move {
            if rx.wait_for(|evicted| *evicted).await.is_err() {
                // Connection gone without eviction; nothing left to signal
                std::future::pending::<()>().await;
            }
        }
    }
}
