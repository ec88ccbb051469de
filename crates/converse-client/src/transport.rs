//! Async boundary to the transport task.
//!
//! The transport runs in its own task; retrieval requests travel to it
//! as typed commands over an mpsc channel, each carrying a oneshot reply
//! slot. A reply slot resolves exactly once: with the result, with the
//! server's error, or with [`ClientError::Canceled`] when the transport
//! drops the slot without answering. Callers are never left waiting on a
//! request that silently evaporated.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use converse_message::Message;

use crate::error::ClientError;
use crate::params::{MessageRetrievalParams, ThreadedMessageListParams};

/// Result of a threaded-replies retrieval: the thread's parent (when the
/// server still has it) and the requested slice of replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadedReplies {
    pub parent: Option<Message>,
    pub replies: Vec<Message>,
}

/// Commands sent *into* the transport task.
#[derive(Debug)]
pub enum TransportCommand {
    /// Retrieve a single message by id.
    FetchMessage {
        params: MessageRetrievalParams,
        reply: oneshot::Sender<Result<Message, ClientError>>,
    },
    /// Retrieve the threaded replies of a message around `timestamp`.
    FetchThreadedReplies {
        timestamp: i64,
        params: ThreadedMessageListParams,
        reply: oneshot::Sender<Result<ThreadedReplies, ClientError>>,
    },
}

/// Retrieve a message with the given parameters.
///
/// Resolves exactly once. A closed command channel means the transport
/// task is gone ([`ClientError::TransportClosed`]); a dropped reply slot
/// surfaces as [`ClientError::Canceled`].
pub async fn fetch_message(
    cmd_tx: &mpsc::Sender<TransportCommand>,
    params: MessageRetrievalParams,
) -> Result<Message, ClientError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    debug!(message_id = params.message_id, channel = %params.channel_url, "Fetching message");

    cmd_tx
        .send(TransportCommand::FetchMessage {
            params,
            reply: reply_tx,
        })
        .await
        .map_err(|_| ClientError::TransportClosed)?;

    reply_rx.await.map_err(|_| ClientError::Canceled)?
}

/// Retrieve the threaded replies of a message, using `timestamp` as the
/// reference point.
pub async fn fetch_threaded_replies(
    cmd_tx: &mpsc::Sender<TransportCommand>,
    timestamp: i64,
    params: ThreadedMessageListParams,
) -> Result<ThreadedReplies, ClientError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    debug!(timestamp, "Fetching threaded replies");

    cmd_tx
        .send(TransportCommand::FetchThreadedReplies {
            timestamp,
            params,
            reply: reply_tx,
        })
        .await
        .map_err(|_| ClientError::TransportClosed)?;

    reply_rx.await.map_err(|_| ClientError::Canceled)?
}

#[cfg(test)]
mod tests {
    use super::*;

    use converse_message::{ChannelType, Message, MessageParams, SendAck, Sender};

    fn confirmed(id: i64) -> Message {
        let mut m = Message::new_pending(
            MessageParams::text("channel-a", ChannelType::Group, "hi"),
            Sender::new("u1", "U1"),
        );
        m.mark_sent(SendAck {
            message_id: id,
            created_at: 1,
            updated_at: 1,
            mentioned_users: vec![],
        })
        .unwrap();
        m
    }

    #[tokio::test]
    async fn test_fetch_message_resolves_with_result() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);

        let transport = tokio::spawn(async move {
            match cmd_rx.recv().await {
                Some(TransportCommand::FetchMessage { params, reply }) => {
                    assert_eq!(params.message_id, 42);
                    let _ = reply.send(Ok(confirmed(42)));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        });

        let params = MessageRetrievalParams::new(42, "channel-a", ChannelType::Group);
        let message = fetch_message(&cmd_tx, params).await.expect("result");
        assert_eq!(message.message_id(), 42);
        transport.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_message_resolves_with_error() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);

        tokio::spawn(async move {
            if let Some(TransportCommand::FetchMessage { reply, .. }) = cmd_rx.recv().await {
                let _ = reply.send(Err(ClientError::NotFound));
            }
        });

        let params = MessageRetrievalParams::new(7, "channel-a", ChannelType::Group);
        let err = fetch_message(&cmd_tx, params).await.unwrap_err();
        assert_eq!(err, ClientError::NotFound);
    }

    #[tokio::test]
    async fn test_dropped_reply_slot_is_cancellation() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);

        tokio::spawn(async move {
            if let Some(TransportCommand::FetchMessage { reply, .. }) = cmd_rx.recv().await {
                // Transport abandons the request without answering.
                drop(reply);
            }
        });

        let params = MessageRetrievalParams::new(7, "channel-a", ChannelType::Group);
        let err = fetch_message(&cmd_tx, params).await.unwrap_err();
        assert_eq!(err, ClientError::Canceled);
    }

    #[tokio::test]
    async fn test_closed_transport_channel() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<TransportCommand>(1);
        drop(cmd_rx);

        let params = MessageRetrievalParams::new(7, "channel-a", ChannelType::Group);
        let err = fetch_message(&cmd_tx, params).await.unwrap_err();
        assert_eq!(err, ClientError::TransportClosed);
    }

    #[tokio::test]
    async fn test_fetch_threaded_replies() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);

        tokio::spawn(async move {
            if let Some(TransportCommand::FetchThreadedReplies {
                timestamp, reply, ..
            }) = cmd_rx.recv().await
            {
                assert_eq!(timestamp, 9_000);
                let _ = reply.send(Ok(ThreadedReplies {
                    parent: Some(confirmed(42)),
                    replies: vec![confirmed(43), confirmed(44)],
                }));
            }
        });

        let result =
            fetch_threaded_replies(&cmd_tx, 9_000, ThreadedMessageListParams::default())
                .await
                .expect("replies");
        assert_eq!(result.parent.as_ref().map(Message::message_id), Some(42));
        assert_eq!(result.replies.len(), 2);
    }
}
