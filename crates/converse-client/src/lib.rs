//! # converse-client
//!
//! Collaborator-side plumbing around [`converse_message::Message`]: the
//! per-channel message collection with its pending-send ledger, the
//! single-writer event queue that applies reaction and thread-info
//! events, and the async retrieval boundary to the transport task.
//!
//! The entity itself carries no synchronization; everything here exists
//! to guarantee that one channel's messages are only ever mutated from
//! one place at a time.

pub mod params;
pub mod store;
pub mod transport;

mod error;

pub use error::ClientError;
pub use params::{MessageRetrievalParams, ThreadedMessageListParams};
pub use store::{spawn_event_worker, ChannelEvent, ChannelMessages, StoreError};
pub use transport::{fetch_message, fetch_threaded_replies, ThreadedReplies, TransportCommand};
