use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Whether a reaction event adds or removes one user's reaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReactionOperation {
    Add,
    Remove,
}

/// An incremental instruction to add or remove one user's reaction on
/// one message. Produced by the channel/network collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionEvent {
    /// Server-assigned id of the message this event targets.
    pub target_message_id: i64,
    /// Emoji key the event operates on.
    pub key: String,
    pub operation: ReactionOperation,
    /// The user acting on the reaction.
    pub user_id: String,
    /// Event time in epoch milliseconds, assigned by the server.
    pub updated_at: i64,
}

/// Aggregated reactions for a single emoji key on a single message.
///
/// The reactor list preserves the order in which users reacted. Per-user
/// timestamps of the last applied event let out-of-order deliveries be
/// discarded instead of flapping the set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    pub key: String,
    /// Users currently reacting with this key, in reaction order.
    pub user_ids: Vec<String>,
    /// Timestamp of the latest event applied to this key.
    pub updated_at: i64,
    /// Last applied event timestamp per user, for stale-event rejection.
    user_updated_at: HashMap<String, i64>,
}

impl Reaction {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            user_ids: Vec::new(),
            updated_at: 0,
            user_updated_at: HashMap::new(),
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|u| u == user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    /// Apply one add/remove for `user_id` stamped `timestamp`.
    ///
    /// Events strictly older than the last one applied for that user are
    /// discarded. On an exact timestamp tie, `Remove` wins: a removal at
    /// the tied timestamp is applied, an add is not.
    ///
    /// Returns whether the event was accepted (a duplicate add or a
    /// removal of an absent user still counts as accepted).
    pub fn apply(&mut self, op: ReactionOperation, user_id: &str, timestamp: i64) -> bool {
        if let Some(&seen) = self.user_updated_at.get(user_id) {
            if timestamp < seen {
                return false;
            }
            if timestamp == seen && op == ReactionOperation::Add {
                return false;
            }
        }

        self.user_updated_at.insert(user_id.to_string(), timestamp);
        if timestamp > self.updated_at {
            self.updated_at = timestamp;
        }

        match op {
            ReactionOperation::Add => {
                if !self.contains(user_id) {
                    self.user_ids.push(user_id.to_string());
                }
            }
            ReactionOperation::Remove => {
                self.user_ids.retain(|u| u != user_id);
            }
        }
        true
    }
}
