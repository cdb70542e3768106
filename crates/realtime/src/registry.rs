//! Connection registry: channel membership and user addressing.
//!
//! Each channel has its own lock so traffic on one channel never waits on
//! another. The user map has a separate lock that is only ever taken while
//! already holding a channel lock (channel first, then users), which keeps
//! both structures consistent: a user entry always points at a connection
//! that is still a member of its channel.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use agentchat_auth::AuthBackend;

use crate::channel::Channel;
use crate::connection::{Connection, Frame};
use crate::error::{RegistryError, CLOSE_INVALID_CHANNEL, CLOSE_NORMAL};
use crate::event::Event;

type Members = RwLock<HashMap<Uuid, Arc<Connection>>>;

pub struct ConnectionRegistry {
    channels: [Members; 3],
    users: RwLock<HashMap<String, Arc<Connection>>>,
    auth: AuthBackend,
}

impl ConnectionRegistry {
    pub fn new(auth: AuthBackend) -> Self {
        Self {
            channels: std::array::from_fn(|_| RwLock::new(HashMap::new())),
            users: RwLock::new(HashMap::new()),
            auth,
        }
    }

    fn members(&self, channel: Channel) -> &Members {
        &self.channels[channel.index()]
    }

    /// Register a transport on `channel`.
    ///
    /// An unknown channel closes the transport with code 4000. A token that
    /// fails verification is not fatal; the connection is simply anonymous.
    /// The `connection` acknowledgement is queued before the connection
    /// becomes visible to broadcasts, so it is always the first frame.
    pub async fn connect(
        &self,
        sender: mpsc::Sender<Frame>,
        channel: &str,
        token: Option<&str>,
    ) -> Result<Arc<Connection>, RegistryError> {
        let channel = match channel.parse::<Channel>() {
            Ok(channel) => channel,
            Err(err) => {
                warn!(channel = %err.0, "Rejecting connection to unknown channel");
                let _ = sender.try_send(Frame::close(CLOSE_INVALID_CHANNEL, "invalid channel"));
                return Err(err.into());
            }
        };

        let user_id = self.auth.verify_optional(token);
        let connection = Arc::new(Connection::new(channel, user_id, sender));

        match Event::connected(channel).to_json() {
            Ok(ack) => connection.send_text(ack)?,
            Err(e) => warn!(error = %e, "Failed to serialize connection acknowledgement"),
        }

        {
            let mut members = self.members(channel).write().await;
            members.insert(connection.id(), Arc::clone(&connection));

            if let Some(user_id) = connection.user_id() {
                let mut users = self.users.write().await;
                if let Some(previous) = users.insert(user_id.to_string(), Arc::clone(&connection)) {
                    debug!(
                        user_id,
                        previous = %previous.id(),
                        "User reconnected; previous connection no longer addressable"
                    );
                }
            }
        }

        gauge!("ws_connections", "channel" => channel.as_str()).increment(1.0);
        info!(
            connection_id = %connection.id(),
            channel = %channel,
            user_id = connection.user_id().unwrap_or("anonymous"),
            "WebSocket connected"
        );

        Ok(connection)
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub async fn disconnect(&self, connection: &Connection) -> bool {
        let channel = connection.channel();
        let removed = {
            let mut members = self.members(channel).write().await;
            let removed = members.remove(&connection.id()).is_some();
            if removed {
                self.forget_user(connection).await;
            }
            removed
        };

        if removed {
            gauge!("ws_connections", "channel" => channel.as_str()).decrement(1.0);
            info!(connection_id = %connection.id(), channel = %channel, "WebSocket disconnected");
        }
        removed
    }

    /// Drop the user entry if it still points at `connection`.
    /// Caller holds the connection's channel lock.
    async fn forget_user(&self, connection: &Connection) {
        if let Some(user_id) = connection.user_id() {
            let mut users = self.users.write().await;
            if users.get(user_id).is_some_and(|c| c.id() == connection.id()) {
                users.remove(user_id);
            }
        }
    }

    /// Deliver `event` to every member of `channel`; returns how many accepted it.
    ///
    /// Members are snapshotted under the read lock and sent to after it is
    /// released. Members whose send failed are pruned once the pass completes.
    pub async fn broadcast(&self, event: &Event, channel: Channel) -> usize {
        let payload = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(event_type = %event.event_type, error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let recipients: Vec<Arc<Connection>> =
            self.members(channel).read().await.values().cloned().collect();

        let mut failed = Vec::new();
        for connection in &recipients {
            if let Err(e) = connection.send_text(payload.clone()) {
                warn!(connection_id = %connection.id(), channel = %channel, error = %e, "Failed to deliver event");
                failed.push(Arc::clone(connection));
            }
        }

        debug!(
            event_type = %event.event_type,
            channel = %channel,
            recipients = recipients.len(),
            failed = failed.len(),
            "Broadcast event"
        );

        if !failed.is_empty() {
            counter!("ws_broadcast_failures_total", "channel" => channel.as_str())
                .increment(failed.len() as u64);
            self.prune(channel, &failed).await;
        }

        recipients.len() - failed.len()
    }

    async fn prune(&self, channel: Channel, dead: &[Arc<Connection>]) {
        let mut members = self.members(channel).write().await;
        let mut pruned = 0usize;
        for connection in dead {
            if members.remove(&connection.id()).is_some() {
                self.forget_user(connection).await;
                connection.evict();
                pruned += 1;
            }
        }
        drop(members);

        if pruned > 0 {
            gauge!("ws_connections", "channel" => channel.as_str()).decrement(pruned as f64);
            info!(channel = %channel, pruned, "Pruned dead connections");
        }
    }

    /// Deliver `event` to the user's current connection, if any.
    /// Returns `false` when the user is not addressable or the send failed.
    pub async fn send_to_user(&self, event: &Event, user_id: &str) -> bool {
        let connection = match self.users.read().await.get(user_id) {
            Some(connection) => Arc::clone(connection),
            None => return false,
        };

        let payload = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(event_type = %event.event_type, error = %e, "Failed to serialize event");
                return false;
            }
        };

        match connection.send_text(payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(connection_id = %connection.id(), user_id, error = %e, "Failed to deliver direct event");
                self.disconnect(&connection).await;
                false
            }
        }
    }

    /// Live connection count for one channel, or across all of them
    pub async fn count(&self, channel: Option<Channel>) -> usize {
        match channel {
            Some(channel) => self.members(channel).read().await.len(),
            None => {
                let mut total = 0;
                for channel in Channel::ALL {
                    total += self.members(channel).read().await.len();
                }
                total
            }
        }
    }

    /// Connection id currently addressable for `user_id`
    pub async fn user_connection(&self, user_id: &str) -> Option<Uuid> {
        self.users.read().await.get(user_id).map(|c| c.id())
    }

    /// Close every connection with a normal close frame and empty the registry
    pub async fn close_all(&self) -> usize {
        let mut closed = 0usize;
        for channel in Channel::ALL {
            let mut members = self.members(channel).write().await;
            let drained: Vec<Arc<Connection>> = members.drain().map(|(_, c)| c).collect();
            if drained.is_empty() {
                continue;
            }

            self.users
                .write()
                .await
                .retain(|_, connection| connection.channel() != channel);
            drop(members);

            for connection in &drained {
                let _ = connection.send(Frame::close(CLOSE_NORMAL, "server shutdown"));
            }
            gauge!("ws_connections", "channel" => channel.as_str()).decrement(drained.len() as f64);
            closed += drained.len();
        }

        info!(closed, "Closed all WebSocket connections");
        closed
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}
