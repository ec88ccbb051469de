use serde::{Deserialize, Serialize};

use crate::sender::Sender;

/// Summary of a message's own reply thread.
///
/// Every message carries one, even with zero replies. The server always
/// sends the summary as a complete snapshot, so updates replace the whole
/// record rather than merging fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Number of replies in the thread.
    pub reply_count: u32,
    /// Epoch-ms timestamp of the most recent reply, `0` if none.
    pub last_replied_at: i64,
    /// Snapshot of the users who replied most, capped server-side.
    pub most_replied_users: Vec<Sender>,
    /// When the server produced this snapshot, epoch ms.
    pub updated_at: i64,
}

impl ThreadInfo {
    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }
}

/// Event carrying a fresh thread summary for one message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadInfoUpdateEvent {
    /// Server-assigned id of the thread's root message.
    pub target_message_id: i64,
    pub thread_info: ThreadInfo,
}
