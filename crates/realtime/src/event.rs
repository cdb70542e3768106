//! Event envelope delivered to channel subscribers
//!
//! Wire shape: `{ "type", "data", "timestamp", "user_id" }`. Events are never
//! persisted; one broadcast to a channel with no subscribers is simply lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::channel::Channel;

pub const CONNECTION_EVENT: &str = "connection";
pub const CHAT_MESSAGE_EVENT: &str = "chat_message";
pub const MESSAGE_EVENT: &str = "message";
pub const DATA_QUERY_EVENT: &str = "data_query";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: Utc::now(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Acknowledgement sent on a freshly registered connection
    pub fn connected(channel: Channel) -> Self {
        Self::new(
            CONNECTION_EVENT,
            object(json!({ "status": "connected", "channel": channel.as_str() })),
        )
    }

    /// Event for text a client sent on `channel`, re-broadcast to its peers
    pub fn inbound(channel: Channel, raw: &str, user_id: Option<String>) -> Self {
        let event_type = match channel {
            Channel::Data => DATA_QUERY_EVENT,
            _ => MESSAGE_EVENT,
        };
        Self::new(event_type, inbound_payload(raw)).with_user(user_id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Embed client text as an object: JSON objects verbatim, anything else under `text`
fn inbound_payload(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => object(json!({ "text": raw })),
    }
}

/// Unwrap a `json!` object literal into its map
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
