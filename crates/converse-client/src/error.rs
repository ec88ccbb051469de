use thiserror::Error;

/// Errors surfaced by retrieval calls and the channel message store.
///
/// Retrieval failures arrive exactly once, through the reply slot of the
/// call that caused them; nothing here is raised as a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The transport canceled the request; the reply slot still resolves
    /// with this error rather than being left dangling.
    #[error("Request was canceled")]
    Canceled,

    /// The transport task is gone; no further requests can be issued.
    #[error("Transport channel closed")]
    TransportClosed,

    /// The transport returned bytes that did not decode into a message.
    #[error("Malformed message payload")]
    MalformedPayload,

    /// No message matched the retrieval parameters.
    #[error("Message not found")]
    NotFound,

    /// Any other server-reported failure, kept verbatim.
    #[error("Server error {code}: {message}")]
    Server { code: u32, message: String },
}
