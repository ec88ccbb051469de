use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a send failed, as reported by the server or the transport.
///
/// Only meaningful while a message is in the `Failed` state; everywhere
/// else it reads as [`ErrorCode::None`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error recorded.
    #[default]
    None,
    /// The request timed out before the server acknowledged it.
    NetworkTimeout,
    /// The connection dropped mid-send.
    ConnectionLost,
    /// The server rejected the send for rate limiting.
    RateLimited,
    /// The server rejected the content (policy / moderation).
    ContentRejected,
    /// The channel is frozen and does not accept messages.
    ChannelFrozen,
    /// The sending user is banned from the channel.
    UserBanned,
    /// Any other server-reported code, kept verbatim.
    Internal(u32),
}

impl ErrorCode {
    /// Whether this failure class is worth retrying.
    ///
    /// Network-class failures are transient; policy rejections are
    /// permanent and resending them would only fail again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkTimeout | Self::ConnectionLost | Self::RateLimited
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Errors produced by the sending-status state machine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    /// The message already succeeded; its identity and timestamps are final.
    #[error("Message already succeeded; cannot transition")]
    AlreadySucceeded,

    /// The acknowledgment did not carry a server-assigned message id.
    #[error("Server ack is missing an assigned message id")]
    MissingMessageId,

    /// `mark_failed` requires a concrete error code.
    #[error("A failed transition requires a non-none error code")]
    MissingErrorCode,

    /// Resend is only permitted from a failed, transient state.
    #[error("Message is not resendable in its current state")]
    NotResendable,

    /// The message was locally canceled and can no longer transition.
    #[error("Message was canceled")]
    Canceled,
}
