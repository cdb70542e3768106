//! Fixed set of fan-out channels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A named fan-out topic. The set is closed; clients cannot create channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Chat,
    Data,
    Notifications,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Chat, Channel::Data, Channel::Notifications];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Chat => "chat",
            Channel::Data => "data",
            Channel::Notifications => "notifications",
        }
    }

    /// Slot of this channel in per-channel tables
    pub(crate) fn index(self) -> usize {
        match self {
            Channel::Chat => 0,
            Channel::Data => 1,
            Channel::Notifications => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised channel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel '{}'", self.0)
    }
}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Channel::Chat),
            "data" => Ok(Channel::Data),
            "notifications" => Ok(Channel::Notifications),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}
