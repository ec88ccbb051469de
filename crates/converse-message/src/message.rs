use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{NO_PARENT_MESSAGE_ID, SURVIVAL_FOREVER, UNASSIGNED_MESSAGE_ID};
use crate::error::{ErrorCode, TransitionError};
use crate::meta_array::MessageMetaArray;
use crate::og_metadata::OgMetaData;
use crate::reaction::{Reaction, ReactionEvent, ReactionOperation};
use crate::sender::Sender;
use crate::thread::{ThreadInfo, ThreadInfoUpdateEvent};
use crate::types::{now_ms, ChannelType, MentionType, SendingStatus};

// ---------------------------------------------------------------------------
// Content variants
// ---------------------------------------------------------------------------

/// The content payload of a message.
///
/// A single tagged variant instead of a class hierarchy: every message
/// kind shares the same envelope (identity, status, reactions, thread
/// info), only the payload differs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageContent {
    /// A user-written text message.
    Text { text: String },
    /// A file attachment message.
    File {
        name: String,
        url: String,
        size: u64,
        mime_type: String,
    },
    /// A server/admin generated notice.
    Admin { text: String },
}

impl MessageContent {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

// ---------------------------------------------------------------------------
// Draft parameters and server acknowledgment
// ---------------------------------------------------------------------------

/// Inputs for creating a local draft message.
#[derive(Debug, Clone)]
pub struct MessageParams {
    pub channel_url: String,
    pub channel_type: ChannelType,
    pub content: MessageContent,
    pub mention_type: MentionType,
    /// User ids the client intends to mention; confirmed by the server
    /// on a successful send.
    pub mentioned_user_ids: Vec<String>,
    pub meta_arrays: Vec<MessageMetaArray>,
    /// Opaque client payload, never interpreted here.
    pub data: String,
    pub custom_type: Option<String>,
    /// `0` for a top-level message, otherwise the thread root's id.
    pub parent_message_id: i64,
    /// TTL in seconds from creation, `-1` for no expiry.
    pub message_survival_seconds: i32,
    pub silent: bool,
}

impl MessageParams {
    pub fn new(
        channel_url: impl Into<String>,
        channel_type: ChannelType,
        content: MessageContent,
    ) -> Self {
        Self {
            channel_url: channel_url.into(),
            channel_type,
            content,
            mention_type: MentionType::default(),
            mentioned_user_ids: Vec::new(),
            meta_arrays: Vec::new(),
            data: String::new(),
            custom_type: None,
            parent_message_id: NO_PARENT_MESSAGE_ID,
            message_survival_seconds: SURVIVAL_FOREVER,
            silent: false,
        }
    }

    pub fn text(
        channel_url: impl Into<String>,
        channel_type: ChannelType,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            channel_url,
            channel_type,
            MessageContent::Text { text: text.into() },
        )
    }
}

/// Server acknowledgment of a successful send.
///
/// Everything the server assigns on confirmation, applied atomically
/// with the status change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendAck {
    pub message_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    /// Confirmed mention snapshot; replaces the requested ids as the
    /// authoritative list.
    pub mentioned_users: Vec<Sender>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single unit of conversation content.
///
/// Created locally as a pending draft or rebuilt from serialized bytes,
/// then mutated in place by reaction and thread-info events arriving
/// from the channel collaborator. All fields are owned by value; the
/// owning channel must go through the mutation methods here and never
/// edit reactions or thread info directly.
///
/// Not internally synchronized: the owner is responsible for serializing
/// access to one instance (one event queue per channel).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    request_id: String,
    message_id: i64,
    sending_status: SendingStatus,
    sender: Option<Sender>,
    channel_url: String,
    channel_type: ChannelType,
    content: MessageContent,
    mention_type: MentionType,
    mentioned_users: Vec<Sender>,
    requested_mention_user_ids: Vec<String>,
    created_at: i64,
    updated_at: i64,
    parent_message_id: i64,
    thread_info: ThreadInfo,
    meta_arrays: Vec<MessageMetaArray>,
    data: String,
    custom_type: Option<String>,
    reactions: Vec<Reaction>,
    message_survival_seconds: i32,
    silent: bool,
    error_code: ErrorCode,
    og_meta_data: Option<OgMetaData>,
}

impl Message {
    /// Create a local draft in `Pending` state with a generated request
    /// id and no server identity yet.
    pub fn new_pending(params: MessageParams, sender: Sender) -> Self {
        let now = now_ms();
        Self {
            request_id: Uuid::new_v4().to_string(),
            message_id: UNASSIGNED_MESSAGE_ID,
            sending_status: SendingStatus::Pending,
            sender: Some(sender),
            channel_url: params.channel_url,
            channel_type: params.channel_type,
            content: params.content,
            mention_type: params.mention_type,
            mentioned_users: Vec::new(),
            requested_mention_user_ids: params.mentioned_user_ids,
            created_at: now,
            updated_at: now,
            parent_message_id: params.parent_message_id,
            thread_info: ThreadInfo::default(),
            meta_arrays: params.meta_arrays,
            data: params.data,
            custom_type: params.custom_type,
            reactions: Vec::new(),
            message_survival_seconds: params.message_survival_seconds,
            silent: params.silent,
            error_code: ErrorCode::None,
            og_meta_data: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Client-generated id correlating this message with its server ack.
    /// Immutable for the life of the entity.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Server-assigned id, [`UNASSIGNED_MESSAGE_ID`] until acknowledged.
    pub fn message_id(&self) -> i64 {
        self.message_id
    }

    pub fn sending_status(&self) -> SendingStatus {
        self.sending_status
    }

    pub fn sender(&self) -> Option<&Sender> {
        self.sender.as_ref()
    }

    pub fn channel_url(&self) -> &str {
        &self.channel_url
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn is_open_channel(&self) -> bool {
        self.channel_type == ChannelType::Open
    }

    pub fn is_group_channel(&self) -> bool {
        self.channel_type == ChannelType::Group
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn mention_type(&self) -> MentionType {
        self.mention_type
    }

    /// Mentions confirmed by the server; empty until the send succeeds.
    pub fn mentioned_users(&self) -> &[Sender] {
        &self.mentioned_users
    }

    /// The client's intended mention targets, authoritative only while
    /// the message is pending or failed.
    pub fn requested_mention_user_ids(&self) -> &[String] {
        &self.requested_mention_user_ids
    }

    /// The authoritative mention list for the current status: requested
    /// ids before confirmation, confirmed ids after.
    pub fn mention_targets(&self) -> Vec<&str> {
        match self.sending_status {
            SendingStatus::Succeeded => self
                .mentioned_users
                .iter()
                .map(|u| u.user_id.as_str())
                .collect(),
            _ => self
                .requested_mention_user_ids
                .iter()
                .map(String::as_str)
                .collect(),
        }
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn parent_message_id(&self) -> i64 {
        self.parent_message_id
    }

    pub fn is_reply(&self) -> bool {
        self.parent_message_id != NO_PARENT_MESSAGE_ID
    }

    pub fn thread_info(&self) -> &ThreadInfo {
        &self.thread_info
    }

    pub fn meta_arrays(&self) -> &[MessageMetaArray] {
        &self.meta_arrays
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn custom_type(&self) -> Option<&str> {
        self.custom_type.as_deref()
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn message_survival_seconds(&self) -> i32 {
        self.message_survival_seconds
    }

    /// Silent messages must not move the channel's last-message pointer
    /// or trigger channel-changed callbacks on the receiving side.
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Meaningful only in the `Failed` state; `ErrorCode::None` otherwise.
    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn og_meta_data(&self) -> Option<&OgMetaData> {
        self.og_meta_data.as_ref()
    }

    /// Epoch-ms instant after which the message expires, `None` if it
    /// never does.
    pub fn expires_at(&self) -> Option<i64> {
        if self.message_survival_seconds < 0 {
            return None;
        }
        Some(self.created_at + i64::from(self.message_survival_seconds) * 1000)
    }

    // -- state machine ------------------------------------------------------

    /// Confirm the send with the server's acknowledgment.
    ///
    /// Sets the assigned id, canonical timestamps and confirmed mention
    /// snapshot together with the `Succeeded` status, so no observer can
    /// see a succeeded message without a server id.
    pub fn mark_sent(&mut self, ack: SendAck) -> Result<(), TransitionError> {
        match self.sending_status {
            SendingStatus::Succeeded => return Err(TransitionError::AlreadySucceeded),
            SendingStatus::Canceled => return Err(TransitionError::Canceled),
            SendingStatus::Pending | SendingStatus::Failed => {}
        }
        if ack.message_id == UNASSIGNED_MESSAGE_ID {
            return Err(TransitionError::MissingMessageId);
        }

        self.message_id = ack.message_id;
        self.created_at = ack.created_at;
        self.updated_at = ack.updated_at.max(ack.created_at);
        self.mentioned_users = ack.mentioned_users;
        self.error_code = ErrorCode::None;
        self.sending_status = SendingStatus::Succeeded;
        Ok(())
    }

    /// Record a send failure. `code` carries the failure class and must
    /// not be `ErrorCode::None`.
    pub fn mark_failed(&mut self, code: ErrorCode) -> Result<(), TransitionError> {
        match self.sending_status {
            SendingStatus::Succeeded => return Err(TransitionError::AlreadySucceeded),
            SendingStatus::Canceled => return Err(TransitionError::Canceled),
            SendingStatus::Pending | SendingStatus::Failed => {}
        }
        if code.is_none() {
            return Err(TransitionError::MissingErrorCode);
        }
        self.error_code = code;
        self.sending_status = SendingStatus::Failed;
        Ok(())
    }

    /// Re-arm a failed message for another send attempt. The only
    /// permitted backward transition, and only for transient failures.
    pub fn mark_resending(&mut self) -> Result<(), TransitionError> {
        if !self.is_resendable() {
            return Err(TransitionError::NotResendable);
        }
        self.error_code = ErrorCode::None;
        self.sending_status = SendingStatus::Pending;
        Ok(())
    }

    /// Discard a local draft that never reached the server.
    pub fn mark_canceled(&mut self) -> Result<(), TransitionError> {
        match self.sending_status {
            SendingStatus::Succeeded => Err(TransitionError::AlreadySucceeded),
            _ => {
                self.sending_status = SendingStatus::Canceled;
                Ok(())
            }
        }
    }

    /// A message can be resent only when it failed with a transient,
    /// network-class error. Permanent rejections stay failed.
    pub fn is_resendable(&self) -> bool {
        self.sending_status == SendingStatus::Failed && self.error_code.is_transient()
    }

    // -- event application --------------------------------------------------

    /// Apply a reaction add/remove event.
    ///
    /// Returns `false` without touching anything when the event targets a
    /// different message (or this message has no server id yet). A
    /// matched event returns `true` even when it lands as an idempotent
    /// no-op or is discarded as older than what was already applied.
    pub fn apply_reaction_event(&mut self, event: &ReactionEvent) -> bool {
        if self.message_id == UNASSIGNED_MESSAGE_ID
            || event.target_message_id != self.message_id
        {
            return false;
        }

        let accepted = if let Some(idx) = self.reactions.iter().position(|r| r.key == event.key) {
            let accepted = self.reactions[idx].apply(event.operation, &event.user_id, event.updated_at);
            if self.reactions[idx].is_empty() {
                // No zero-reactor placeholders are kept around.
                self.reactions.remove(idx);
            }
            accepted
        } else {
            match event.operation {
                ReactionOperation::Add => {
                    let mut reaction = Reaction::new(event.key.clone());
                    reaction.apply(event.operation, &event.user_id, event.updated_at);
                    self.reactions.push(reaction);
                    true
                }
                // Removing from an absent summary: matched, nothing to do.
                ReactionOperation::Remove => false,
            }
        };

        if accepted && event.updated_at > self.updated_at {
            self.updated_at = event.updated_at;
        }
        true
    }

    /// Replace the thread summary with the event's snapshot.
    ///
    /// Thread info is always delivered complete, so this is a wholesale
    /// replace, never a merge. Returns `false` on a target mismatch.
    pub fn apply_thread_info_update(&mut self, event: &ThreadInfoUpdateEvent) -> bool {
        if self.message_id == UNASSIGNED_MESSAGE_ID
            || event.target_message_id != self.message_id
        {
            return false;
        }
        self.thread_info = event.thread_info.clone();
        if self.thread_info.updated_at > self.updated_at {
            self.updated_at = self.thread_info.updated_at;
        }
        true
    }

    // -- derived views ------------------------------------------------------

    /// The text a reply shows for this message when it is the thread
    /// parent: the message text, or the file name for file content.
    pub fn summary_text(&self) -> &str {
        match &self.content {
            MessageContent::Text { text } | MessageContent::Admin { text } => text,
            MessageContent::File { name, .. } => name,
        }
    }

    /// Derive this reply's parent text from the given parent message at
    /// read time; nothing is stored redundantly. `None` unless `parent`
    /// actually is this message's parent.
    pub fn parent_message_text(&self, parent: &Message) -> Option<String> {
        if self.parent_message_id == NO_PARENT_MESSAGE_ID
            || parent.message_id != self.parent_message_id
        {
            return None;
        }
        Some(parent.summary_text().to_string())
    }

    /// The meta arrays whose key is in `keys`, in canonical order.
    pub fn meta_arrays_with_keys(&self, keys: &[&str]) -> Vec<MessageMetaArray> {
        self.meta_arrays
            .iter()
            .filter(|m| keys.contains(&m.key.as_str()))
            .cloned()
            .collect()
    }

    /// Legacy map view of the meta arrays.
    ///
    /// Lossy: duplicate keys collapse, with their values concatenated in
    /// canonical order. Derived on every call, never stored.
    pub fn meta_array_map(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for entry in &self.meta_arrays {
            map.entry(entry.key.clone())
                .or_default()
                .extend(entry.value.iter().cloned());
        }
        map
    }

    /// Attach a link preview. The first one attached wins; returns
    /// `false` if one is already present.
    pub fn set_og_meta_data(&mut self, og: OgMetaData) -> bool {
        if self.og_meta_data.is_some() {
            return false;
        }
        self.og_meta_data = Some(og);
        true
    }

    // -- serialization ------------------------------------------------------

    /// Serialize the canonical record to bytes.
    ///
    /// Returns `None` when the entity is not in a representable state
    /// (for example a half-built record with no identity at all), so a
    /// cache never receives a blob it could not rebuild from.
    pub fn serialize(&self) -> Option<Vec<u8>> {
        if !self.is_well_formed() {
            return None;
        }
        bincode::serialize(self).ok()
    }

    /// Rebuild a message from serialized bytes.
    ///
    /// Total over arbitrary input: malformed bytes or a record violating
    /// the entity's invariants yield `None`, never a partially populated
    /// message.
    pub fn build_from_serialized_data(data: &[u8]) -> Option<Self> {
        let message: Message = bincode::deserialize(data).ok()?;
        if !message.is_well_formed() {
            return None;
        }
        Some(message)
    }

    /// The invariants every observable message upholds. Checked before
    /// serializing and after deserializing.
    fn is_well_formed(&self) -> bool {
        if self.channel_url.is_empty() {
            return false;
        }
        // A message needs at least one identity: a request id locally,
        // a server id once acknowledged.
        if self.message_id == UNASSIGNED_MESSAGE_ID && self.request_id.is_empty() {
            return false;
        }
        match self.sending_status {
            SendingStatus::Succeeded if self.message_id == UNASSIGNED_MESSAGE_ID => return false,
            SendingStatus::Failed if self.error_code.is_none() => return false,
            _ => {}
        }
        if self.updated_at < self.created_at {
            return false;
        }
        // A message cannot be its own thread parent.
        if self.message_id != UNASSIGNED_MESSAGE_ID && self.parent_message_id == self.message_id {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(id: &str) -> Sender {
        Sender::new(id, id.to_uppercase())
    }

    fn confirmed_message(id: i64) -> Message {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hello"),
            sender("u0"),
        );
        m.mark_sent(SendAck {
            message_id: id,
            created_at: 1_000,
            updated_at: 1_000,
            mentioned_users: vec![],
        })
        .expect("mark_sent");
        m
    }

    fn reaction_event(target: i64, key: &str, op: ReactionOperation, user: &str, ts: i64) -> ReactionEvent {
        ReactionEvent {
            target_message_id: target,
            key: key.to_string(),
            operation: op,
            user_id: user.to_string(),
            updated_at: ts,
        }
    }

    #[test]
    fn test_pending_send_confirmation() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            sender("u1"),
        );
        let request_id = m.request_id().to_string();
        assert_eq!(m.sending_status(), SendingStatus::Pending);
        assert_eq!(m.message_id(), UNASSIGNED_MESSAGE_ID);

        m.mark_sent(SendAck {
            message_id: 42,
            created_at: 5_000,
            updated_at: 5_000,
            mentioned_users: vec![sender("u2")],
        })
        .expect("confirmation");

        assert_eq!(m.sending_status(), SendingStatus::Succeeded);
        assert_eq!(m.message_id(), 42);
        assert_eq!(m.request_id(), request_id);
    }

    #[test]
    fn test_succeeded_is_terminal() {
        let mut m = confirmed_message(42);
        let err = m.mark_sent(SendAck {
            message_id: 43,
            created_at: 2_000,
            updated_at: 2_000,
            mentioned_users: vec![],
        });
        assert_eq!(err, Err(TransitionError::AlreadySucceeded));
        assert_eq!(m.message_id(), 42);
        assert_eq!(m.mark_failed(ErrorCode::NetworkTimeout), Err(TransitionError::AlreadySucceeded));
    }

    #[test]
    fn test_ack_without_id_rejected() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            sender("u1"),
        );
        let err = m.mark_sent(SendAck {
            message_id: UNASSIGNED_MESSAGE_ID,
            created_at: 1,
            updated_at: 1,
            mentioned_users: vec![],
        });
        assert_eq!(err, Err(TransitionError::MissingMessageId));
        assert_eq!(m.sending_status(), SendingStatus::Pending);
    }

    #[test]
    fn test_resendable_classification() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            sender("u1"),
        );
        assert!(!m.is_resendable());

        m.mark_failed(ErrorCode::NetworkTimeout).unwrap();
        assert!(m.is_resendable());

        m.mark_resending().unwrap();
        assert_eq!(m.sending_status(), SendingStatus::Pending);
        assert_eq!(m.error_code(), ErrorCode::None);

        m.mark_failed(ErrorCode::ContentRejected).unwrap();
        assert!(!m.is_resendable());
        assert_eq!(m.mark_resending(), Err(TransitionError::NotResendable));
    }

    #[test]
    fn test_failed_requires_error_code() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            sender("u1"),
        );
        assert_eq!(m.mark_failed(ErrorCode::None), Err(TransitionError::MissingErrorCode));
        assert_eq!(m.sending_status(), SendingStatus::Pending);
    }

    #[test]
    fn test_mention_authority_switches_on_confirmation() {
        let mut params = MessageParams::text("channel-a", ChannelType::Group, "hi @u2");
        params.mentioned_user_ids = vec!["u2".to_string(), "u3".to_string()];
        let mut m = Message::new_pending(params, sender("u1"));
        assert_eq!(m.mention_targets(), vec!["u2", "u3"]);

        // Server confirms only u2 as actually mentioned.
        m.mark_sent(SendAck {
            message_id: 7,
            created_at: 1,
            updated_at: 1,
            mentioned_users: vec![sender("u2")],
        })
        .unwrap();
        assert_eq!(m.mention_targets(), vec!["u2"]);
    }

    #[test]
    fn test_reaction_add_remove_prunes_key() {
        let mut m = confirmed_message(42);
        assert!(m.apply_reaction_event(&reaction_event(42, "👍", ReactionOperation::Add, "u1", 10)));
        assert_eq!(m.reactions().len(), 1);
        assert_eq!(m.reactions()[0].user_ids, vec!["u1"]);

        assert!(m.apply_reaction_event(&reaction_event(42, "👍", ReactionOperation::Remove, "u1", 20)));
        assert!(m.reactions().is_empty());
    }

    #[test]
    fn test_reaction_target_mismatch_leaves_message_untouched() {
        let mut m = confirmed_message(42);
        let before = m.clone();
        assert!(!m.apply_reaction_event(&reaction_event(99, "👍", ReactionOperation::Add, "u1", 10)));
        assert_eq!(m, before);
    }

    #[test]
    fn test_reaction_on_unassigned_id_rejected() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            sender("u1"),
        );
        assert!(!m.apply_reaction_event(&reaction_event(0, "👍", ReactionOperation::Add, "u1", 10)));
        assert!(m.reactions().is_empty());
    }

    #[test]
    fn test_reaction_remove_absent_key_matches() {
        let mut m = confirmed_message(42);
        // Target matched, nothing to remove: still reported as handled.
        assert!(m.apply_reaction_event(&reaction_event(42, "🎉", ReactionOperation::Remove, "u1", 10)));
        assert!(m.reactions().is_empty());
    }

    #[test]
    fn test_reaction_bumps_updated_at_monotonically() {
        let mut m = confirmed_message(42);
        m.apply_reaction_event(&reaction_event(42, "👍", ReactionOperation::Add, "u1", 9_000));
        assert_eq!(m.updated_at(), 9_000);
        // An older (stale-per-user) event must not move the clock back.
        m.apply_reaction_event(&reaction_event(42, "👍", ReactionOperation::Add, "u1", 4_000));
        assert_eq!(m.updated_at(), 9_000);
    }

    #[test]
    fn test_thread_info_full_replace() {
        let mut m = confirmed_message(42);
        let first = ThreadInfoUpdateEvent {
            target_message_id: 42,
            thread_info: ThreadInfo {
                reply_count: 2,
                last_replied_at: 8_000,
                most_replied_users: vec![sender("u1")],
                updated_at: 8_000,
            },
        };
        let second = ThreadInfoUpdateEvent {
            target_message_id: 42,
            thread_info: ThreadInfo {
                reply_count: 1,
                last_replied_at: 9_000,
                most_replied_users: vec![],
                updated_at: 9_000,
            },
        };
        assert!(m.apply_thread_info_update(&first));
        assert!(m.apply_thread_info_update(&second));
        assert_eq!(m.thread_info(), &second.thread_info);
        assert_eq!(m.updated_at(), 9_000);
    }

    #[test]
    fn test_thread_info_target_mismatch() {
        let mut m = confirmed_message(42);
        let event = ThreadInfoUpdateEvent {
            target_message_id: 7,
            thread_info: ThreadInfo::default(),
        };
        let before = m.clone();
        assert!(!m.apply_thread_info_update(&event));
        assert_eq!(m, before);
    }

    #[test]
    fn test_parent_message_text_derived_at_read_time() {
        let parent = confirmed_message(42);
        let mut params = MessageParams::text("channel-a", ChannelType::Group, "a reply");
        params.parent_message_id = 42;
        let reply = Message::new_pending(params, sender("u2"));

        assert_eq!(reply.parent_message_text(&parent), Some("hello".to_string()));

        // Wrong parent yields nothing.
        let other = confirmed_message(43);
        assert_eq!(reply.parent_message_text(&other), None);
    }

    #[test]
    fn test_parent_text_for_file_parent_is_file_name() {
        let mut m = Message::new_pending(
            MessageParams::new(
                "channel-a",
                ChannelType::Group,
                MessageContent::File {
                    name: "photo.png".to_string(),
                    url: "https://files.example/photo.png".to_string(),
                    size: 1024,
                    mime_type: "image/png".to_string(),
                },
            ),
            sender("u1"),
        );
        m.mark_sent(SendAck {
            message_id: 50,
            created_at: 1,
            updated_at: 1,
            mentioned_users: vec![],
        })
        .unwrap();

        let mut params = MessageParams::text("channel-a", ChannelType::Group, "nice");
        params.parent_message_id = 50;
        let reply = Message::new_pending(params, sender("u2"));
        assert_eq!(reply.parent_message_text(&m), Some("photo.png".to_string()));
    }

    #[test]
    fn test_meta_array_map_collapses_duplicates() {
        let mut params = MessageParams::text("channel-a", ChannelType::Group, "hi");
        params.meta_arrays = vec![
            MessageMetaArray::new("tags", vec!["a".into(), "b".into()]),
            MessageMetaArray::new("refs", vec!["x".into()]),
            MessageMetaArray::new("tags", vec!["c".into()]),
        ];
        let m = Message::new_pending(params, sender("u1"));

        // Canonical view keeps both "tags" entries in order.
        assert_eq!(m.meta_arrays().len(), 3);
        let filtered = m.meta_arrays_with_keys(&["tags"]);
        assert_eq!(filtered.len(), 2);

        // Legacy map view collapses them.
        let map = m.meta_array_map();
        assert_eq!(map["tags"], vec!["a", "b", "c"]);
        assert_eq!(map["refs"], vec!["x"]);
    }

    #[test]
    fn test_og_meta_data_first_wins() {
        let mut m = confirmed_message(42);
        let first = OgMetaData {
            url: "https://a.example".to_string(),
            title: Some("A".to_string()),
            ..Default::default()
        };
        let second = OgMetaData {
            url: "https://b.example".to_string(),
            ..Default::default()
        };
        assert!(m.set_og_meta_data(first.clone()));
        assert!(!m.set_og_meta_data(second));
        assert_eq!(m.og_meta_data(), Some(&first));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut params = MessageParams::text("channel-a", ChannelType::Open, "hello world");
        params.meta_arrays = vec![
            MessageMetaArray::new("k2", vec!["v1".into()]),
            MessageMetaArray::new("k1", vec!["v2".into(), "v3".into()]),
        ];
        params.data = "{\"x\":1}".to_string();
        params.custom_type = Some("note".to_string());
        let mut m = Message::new_pending(params, sender("u1"));
        m.mark_sent(SendAck {
            message_id: 42,
            created_at: 1_000,
            updated_at: 2_000,
            mentioned_users: vec![sender("u2")],
        })
        .unwrap();
        m.apply_reaction_event(&reaction_event(42, "👍", ReactionOperation::Add, "u2", 3_000));
        m.apply_reaction_event(&reaction_event(42, "🎉", ReactionOperation::Add, "u3", 3_500));
        m.apply_thread_info_update(&ThreadInfoUpdateEvent {
            target_message_id: 42,
            thread_info: ThreadInfo {
                reply_count: 1,
                last_replied_at: 4_000,
                most_replied_users: vec![sender("u3")],
                updated_at: 4_000,
            },
        });

        let bytes = m.serialize().expect("serializable");
        let rebuilt = Message::build_from_serialized_data(&bytes).expect("well-formed");
        assert_eq!(rebuilt, m);
        // Order-sensitive fields survive in order.
        assert_eq!(rebuilt.meta_arrays()[0].key, "k2");
        assert_eq!(rebuilt.reactions()[0].key, "👍");
        assert_eq!(rebuilt.reactions()[1].key, "🎉");
    }

    #[test]
    fn test_serialize_rejects_unrepresentable_state() {
        let m = Message::new_pending(
            MessageParams::text("", ChannelType::Group, "no channel"),
            sender("u1"),
        );
        assert!(m.serialize().is_none());
    }

    #[test]
    fn test_deserialize_rejects_malformed_bytes() {
        assert!(Message::build_from_serialized_data(&[0xFF, 0x00, 0x13, 0x37]).is_none());
        assert!(Message::build_from_serialized_data(&[]).is_none());
    }

    #[test]
    fn test_expires_at() {
        let m = confirmed_message(42);
        assert_eq!(m.expires_at(), None);

        let mut params = MessageParams::text("channel-a", ChannelType::Group, "ttl");
        params.message_survival_seconds = 60;
        let mut m = Message::new_pending(params, sender("u1"));
        m.mark_sent(SendAck {
            message_id: 9,
            created_at: 10_000,
            updated_at: 10_000,
            mentioned_users: vec![],
        })
        .unwrap();
        assert_eq!(m.expires_at(), Some(70_000));
    }

    #[test]
    fn test_canceled_draft_stops_transitioning() {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "bye"),
            sender("u1"),
        );
        m.mark_canceled().unwrap();
        assert_eq!(m.sending_status(), SendingStatus::Canceled);
        let ack = SendAck {
            message_id: 1,
            created_at: 1,
            updated_at: 1,
            mentioned_users: vec![],
        };
        assert_eq!(m.mark_sent(ack), Err(TransitionError::Canceled));
    }
}
