//! Real-time state shared by the WebSocket handlers

use std::sync::Arc;

use crate::registry::ConnectionRegistry;

#[derive(Clone, Debug)]
pub struct RealtimeState {
    pub registry: Arc<ConnectionRegistry>,
    /// Outbound queue depth per connection
    pub send_buffer: usize,
}

impl RealtimeState {
    pub fn new(registry: Arc<ConnectionRegistry>, send_buffer: usize) -> Self {
        Self {
            registry,
            send_buffer,
        }
    }
}
