use serde::{Deserialize, Serialize};

use crate::constants::{CHANNEL_TYPE_GROUP, CHANNEL_TYPE_OPEN};

/// The kind of channel a message belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Open,
    Group,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => CHANNEL_TYPE_OPEN,
            Self::Group => CHANNEL_TYPE_GROUP,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            CHANNEL_TYPE_OPEN => Some(Self::Open),
            CHANNEL_TYPE_GROUP => Some(Self::Group),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery state of a message with respect to the server.
///
/// `Pending` while the send is in flight, then either `Succeeded` or
/// `Failed`. A failed message may move back to `Pending` on an explicit
/// resend; `Succeeded` is terminal. `Canceled` marks a local draft the
/// user discarded before it ever reached the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SendingStatus {
    Pending,
    Failed,
    Succeeded,
    Canceled,
}

/// How the mention list of a message should be interpreted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum MentionType {
    /// Only the listed users are mentioned.
    #[default]
    Users,
    /// The whole channel is mentioned.
    Channel,
}

/// Current epoch time in milliseconds, the unit used for every
/// timestamp on a message.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_roundtrip() {
        assert_eq!(ChannelType::from_str("open"), Some(ChannelType::Open));
        assert_eq!(ChannelType::from_str("group"), Some(ChannelType::Group));
        assert_eq!(ChannelType::from_str("broadcast"), None);
        assert_eq!(ChannelType::Group.as_str(), "group");
    }
}
