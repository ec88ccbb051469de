//! Per-channel message collection.
//!
//! A channel owns its messages by value: confirmed messages indexed by
//! server id, local drafts (pending or failed sends) in a ledger keyed
//! by request id. All event application goes through this collection so
//! a single writer per channel is enough to keep every entity
//! consistent; [`spawn_event_worker`] provides that single writer as a
//! dedicated task draining the channel's event queue.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use converse_message::{
    ErrorCode, Message, ReactionEvent, SendAck, SendingStatus, ThreadInfoUpdateEvent,
    TransitionError,
};

/// Errors produced by the channel message store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The message belongs to a different channel.
    #[error("Message belongs to channel '{actual}', not '{expected}'")]
    WrongChannel { expected: String, actual: String },

    /// No draft in the ledger carries this request id.
    #[error("No pending message with request id '{0}'")]
    UnknownRequestId(String),

    /// The message is not a pending draft.
    #[error("Message is not a pending draft")]
    NotPending,

    /// Only server-confirmed messages can enter the confirmed index.
    #[error("Message is not server-confirmed")]
    NotConfirmed,

    /// The underlying status transition was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Events applied to a channel's messages, one queue per channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Reaction(ReactionEvent),
    ThreadInfoUpdate(ThreadInfoUpdateEvent),
}

/// The messages of one channel.
#[derive(Debug, Default)]
pub struct ChannelMessages {
    channel_url: String,
    /// Server-confirmed messages in id order.
    confirmed: BTreeMap<i64, Message>,
    /// Local drafts awaiting ack or resend, in creation order.
    drafts: Vec<Message>,
    /// Id of the message the channel shows as its latest. Silent
    /// messages never move this pointer.
    last_message_id: Option<i64>,
}

impl ChannelMessages {
    pub fn new(channel_url: impl Into<String>) -> Self {
        Self {
            channel_url: channel_url.into(),
            ..Default::default()
        }
    }

    pub fn channel_url(&self) -> &str {
        &self.channel_url
    }

    pub fn message(&self, message_id: i64) -> Option<&Message> {
        self.confirmed.get(&message_id)
    }

    pub fn draft(&self, request_id: &str) -> Option<&Message> {
        self.drafts.iter().find(|m| m.request_id() == request_id)
    }

    /// Confirmed messages in ascending id order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.confirmed.values()
    }

    pub fn drafts(&self) -> &[Message] {
        &self.drafts
    }

    /// The channel's latest non-silent confirmed message.
    pub fn last_message(&self) -> Option<&Message> {
        self.last_message_id.and_then(|id| self.confirmed.get(&id))
    }

    // -- pending-send ledger ------------------------------------------------

    /// Add a freshly created local draft to the ledger.
    pub fn add_draft(&mut self, message: Message) -> Result<(), StoreError> {
        self.check_channel(&message)?;
        if message.sending_status() != SendingStatus::Pending {
            return Err(StoreError::NotPending);
        }
        debug!(request_id = %message.request_id(), channel = %self.channel_url, "Draft queued");
        self.drafts.push(message);
        Ok(())
    }

    /// Apply the server ack for the draft with `request_id` and promote
    /// it into the confirmed index.
    pub fn confirm(&mut self, request_id: &str, ack: SendAck) -> Result<&Message, StoreError> {
        let idx = self.draft_index(request_id)?;
        self.drafts[idx].mark_sent(ack)?;

        let message = self.drafts.remove(idx);
        let id = message.message_id();
        debug!(request_id, message_id = id, "Send confirmed");
        self.bump_last_message(&message);
        Ok(self.confirmed.entry(id).or_insert(message))
    }

    /// Record a send failure for the draft with `request_id`. The draft
    /// stays in the ledger so it can be resent or discarded.
    pub fn fail(&mut self, request_id: &str, code: ErrorCode) -> Result<(), StoreError> {
        let idx = self.draft_index(request_id)?;
        self.drafts[idx].mark_failed(code)?;
        warn!(request_id, ?code, "Send failed");
        Ok(())
    }

    /// Re-arm a failed draft and hand back a copy for retransmission.
    /// The draft itself stays in the ledger, now pending again.
    pub fn take_resendable(&mut self, request_id: &str) -> Result<Message, StoreError> {
        let idx = self.draft_index(request_id)?;
        self.drafts[idx].mark_resending()?;
        debug!(request_id, "Draft re-armed for resend");
        Ok(self.drafts[idx].clone())
    }

    /// Cancel a draft and drop it from the ledger. Confirmed state is
    /// never touched.
    pub fn discard(&mut self, request_id: &str) -> Result<Message, StoreError> {
        let idx = self.draft_index(request_id)?;
        self.drafts[idx].mark_canceled()?;
        Ok(self.drafts.remove(idx))
    }

    /// Insert a server-confirmed message received from the network or a
    /// cache. Re-inserting an id replaces the held copy.
    pub fn insert_confirmed(&mut self, message: Message) -> Result<(), StoreError> {
        self.check_channel(&message)?;
        if message.sending_status() != SendingStatus::Succeeded {
            return Err(StoreError::NotConfirmed);
        }
        self.bump_last_message(&message);
        self.confirmed.insert(message.message_id(), message);
        Ok(())
    }

    // -- event application --------------------------------------------------

    /// Route a reaction event to the targeted message.
    ///
    /// Returns `false` when no held message matches the target id; an
    /// unrelated message is never mutated.
    pub fn apply_reaction_event(&mut self, event: &ReactionEvent) -> bool {
        match self.confirmed.get_mut(&event.target_message_id) {
            Some(message) => message.apply_reaction_event(event),
            None => {
                warn!(
                    target_id = event.target_message_id,
                    key = %event.key,
                    "Reaction event for unknown message ignored"
                );
                false
            }
        }
    }

    /// Route a thread-info update to the targeted message.
    pub fn apply_thread_info_update(&mut self, event: &ThreadInfoUpdateEvent) -> bool {
        match self.confirmed.get_mut(&event.target_message_id) {
            Some(message) => message.apply_thread_info_update(event),
            None => {
                warn!(
                    target_id = event.target_message_id,
                    "Thread info update for unknown message ignored"
                );
                false
            }
        }
    }

    // -- internals ----------------------------------------------------------

    fn draft_index(&self, request_id: &str) -> Result<usize, StoreError> {
        self.drafts
            .iter()
            .position(|m| m.request_id() == request_id)
            .ok_or_else(|| StoreError::UnknownRequestId(request_id.to_string()))
    }

    fn check_channel(&self, message: &Message) -> Result<(), StoreError> {
        if message.channel_url() != self.channel_url {
            return Err(StoreError::WrongChannel {
                expected: self.channel_url.clone(),
                actual: message.channel_url().to_string(),
            });
        }
        Ok(())
    }

    fn bump_last_message(&mut self, message: &Message) {
        if message.is_silent() {
            return;
        }
        let newer = match self.last_message_id.and_then(|id| self.confirmed.get(&id)) {
            Some(last) => message.created_at() >= last.created_at(),
            None => true,
        };
        if newer {
            self.last_message_id = Some(message.message_id());
        }
    }
}

/// Spawn the single writer for one channel's event queue.
///
/// Every reaction and thread-info event for the channel funnels through
/// this task, which is what makes uncoordinated concurrent mutation of a
/// message impossible by construction.
pub fn spawn_event_worker(
    mut rx: mpsc::Receiver<ChannelEvent>,
    store: Arc<Mutex<ChannelMessages>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut store = match store.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    error!("Channel store lock poisoned; stopping event worker");
                    return;
                }
            };
            match event {
                ChannelEvent::Reaction(e) => {
                    let applied = store.apply_reaction_event(&e);
                    debug!(target_id = e.target_message_id, applied, "Reaction event processed");
                }
                ChannelEvent::ThreadInfoUpdate(e) => {
                    let applied = store.apply_thread_info_update(&e);
                    debug!(target_id = e.target_message_id, applied, "Thread info update processed");
                }
            }
        }
        debug!("Channel event queue closed");
    })
}
