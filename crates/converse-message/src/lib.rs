//! # converse-message
//!
//! The message entity at the core of the Converse chat client SDK.
//!
//! A [`Message`] is created locally as a pending draft or rebuilt from
//! serialized bytes, acknowledged or rejected by the server, and then
//! patched in place by reaction and thread-info events streaming in from
//! the channel collaborator. This crate owns the entity's state machine,
//! its event-application rules and the byte-level serialization contract;
//! transport, channel collections and persistence live elsewhere.

pub mod constants;
pub mod message;
pub mod meta_array;
pub mod og_metadata;
pub mod reaction;
pub mod sender;
pub mod thread;
pub mod types;

mod error;

pub use error::{ErrorCode, TransitionError};
pub use message::{Message, MessageContent, MessageParams, SendAck};
pub use meta_array::MessageMetaArray;
pub use og_metadata::{OgImage, OgMetaData};
pub use reaction::{Reaction, ReactionEvent, ReactionOperation};
pub use sender::Sender;
pub use thread::{ThreadInfo, ThreadInfoUpdateEvent};
pub use types::{ChannelType, MentionType, SendingStatus};
