use serde::{Deserialize, Serialize};

/// Snapshot of the user who sent a message.
///
/// This is a copy taken at send/receive time, not a live reference:
/// later profile edits do not retroactively change messages already
/// in a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sender {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name at the time the message was sent.
    pub nickname: String,
    /// Avatar URL at the time the message was sent.
    pub profile_url: String,
}

impl Sender {
    pub fn new(user_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: nickname.into(),
            profile_url: String::new(),
        }
    }
}
