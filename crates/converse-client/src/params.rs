use serde::{Deserialize, Serialize};

use converse_message::ChannelType;

/// Parameters for retrieving a single message by id.
///
/// Forwarded to the transport as-is; the include flags tell the server
/// which optional sections to populate on the returned record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRetrievalParams {
    pub message_id: i64,
    pub channel_url: String,
    pub channel_type: ChannelType,
    pub include_reactions: bool,
    pub include_meta_arrays: bool,
    pub include_thread_info: bool,
    pub include_parent_message_info: bool,
}

impl MessageRetrievalParams {
    pub fn new(message_id: i64, channel_url: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            message_id,
            channel_url: channel_url.into(),
            channel_type,
            include_reactions: true,
            include_meta_arrays: true,
            include_thread_info: true,
            include_parent_message_info: false,
        }
    }
}

/// Parameters for retrieving the threaded replies of a message around a
/// reference timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadedMessageListParams {
    /// How many replies before the reference timestamp.
    pub previous_result_size: u32,
    /// How many replies after the reference timestamp.
    pub next_result_size: u32,
    /// Whether a reply exactly at the reference timestamp is included.
    pub inclusive: bool,
    /// Newest-first ordering when set.
    pub reverse: bool,
    pub include_reactions: bool,
    pub include_meta_arrays: bool,
    pub include_parent_message_info: bool,
}

impl Default for ThreadedMessageListParams {
    fn default() -> Self {
        Self {
            previous_result_size: 20,
            next_result_size: 20,
            inclusive: false,
            reverse: false,
            include_reactions: true,
            include_meta_arrays: true,
            include_parent_message_info: false,
        }
    }
}
