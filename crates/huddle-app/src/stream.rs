//! Message-passing boundary with the stream adapter.
//!
//! The adapter pushes normalized [`StreamBatch`]es into a [`StreamSender`];
//! the runtime pulls them from the matching [`StreamReceiver`] in send order.
//! Nothing downstream registers callbacks with the adapter, so ordering and
//! teardown can be exercised without a live backend.

use huddle_core::InboxRecord;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{AppError, SubscriptionId};

/// Kind of change reported for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Document appeared.
    Added,
    /// Document changed in place.
    Modified,
    /// Document was deleted.
    Removed,
}

/// One document change within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChange<T> {
    /// What happened to the document.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Document contents after the change (before it, for removals).
    pub doc: T,
}

impl<T> DocChange<T> {
    /// Document was added.
    pub fn added(doc: T) -> Self {
        Self { kind: ChangeKind::Added, doc }
    }

    /// Document was modified.
    pub fn modified(doc: T) -> Self {
        Self { kind: ChangeKind::Modified, doc }
    }

    /// Document was removed.
    pub fn removed(doc: T) -> Self {
        Self { kind: ChangeKind::Removed, doc }
    }
}

/// A batch of changes delivered by one backend notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamBatch {
    /// Changes to the local user's inbox collection.
    Inbox {
        /// Document changes in delivery order.
        changes: Vec<DocChange<InboxRecord>>,
    },

    /// A room's message collection changed size.
    Messages {
        /// Subscription the notification was delivered on.
        subscription: SubscriptionId,
        /// Number of messages now in the room.
        message_count: u64,
    },
}

/// Create a bounded stream channel. A capacity of 0 is raised to 1.
pub fn stream_channel(capacity: usize) -> (StreamSender, StreamReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (StreamSender { tx }, StreamReceiver { rx })
}

/// Adapter side of the stream channel.
#[derive(Debug, Clone)]
pub struct StreamSender {
    tx: mpsc::Sender<StreamBatch>,
}

impl StreamSender {
    /// Send a batch, waiting for capacity.
    pub async fn send(&self, batch: StreamBatch) -> Result<(), AppError> {
        self.tx.send(batch).await.map_err(|_| AppError::ChannelClosed)
    }

    /// Send a batch without waiting.
    pub fn try_send(&self, batch: StreamBatch) -> Result<(), AppError> {
        self.tx.try_send(batch).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AppError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => AppError::ChannelClosed,
        })
    }
}

/// Runtime side of the stream channel.
#[derive(Debug)]
pub struct StreamReceiver {
    rx: mpsc::Receiver<StreamBatch>,
}

impl StreamReceiver {
    /// Next batch. `None` once every sender is dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<StreamBatch> {
        self.rx.recv().await
    }

    /// Next batch if one is queued. Never waits.
    pub fn try_recv(&mut self) -> Option<StreamBatch> {
        self.rx.try_recv().ok()
    }

    /// Number of queued batches.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check if no batch is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use huddle_core::RoomId;

    use super::*;

    fn messages(count: u64) -> StreamBatch {
        StreamBatch::Messages {
            subscription: SubscriptionId { room_id: RoomId::new("r1"), generation: 1 },
            message_count: count,
        }
    }

    #[test]
    fn batches_arrive_in_send_order() {
        let (tx, mut rx) = stream_channel(4);
        tx.try_send(messages(1)).unwrap();
        tx.try_send(messages(2)).unwrap();

        assert_eq!(rx.try_recv(), Some(messages(1)));
        assert_eq!(rx.try_recv(), Some(messages(2)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn full_and_closed_are_reported() {
        let (tx, rx) = stream_channel(0);
        tx.try_send(messages(1)).unwrap();
        assert_eq!(tx.try_send(messages(2)), Err(AppError::ChannelFull));

        drop(rx);
        assert_eq!(tx.try_send(messages(3)), Err(AppError::ChannelClosed));
    }

    #[tokio::test]
    async fn recv_ends_after_senders_drop() {
        let (tx, mut rx) = stream_channel(4);
        tx.send(messages(1)).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(messages(1)));
        assert_eq!(rx.recv().await, None);
    }
}
