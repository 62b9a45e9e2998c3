//! Stream-to-Application translation layer.
//!
//! The [`Bridge`] sits between the stream adapter and the [`crate::App`]. It
//! mirrors the backend collections the app cares about and turns raw change
//! batches into normalized [`crate::AppEvent`]s.
//!
//! # Responsibilities
//!
//! - Applies inbox document changes to an ordered mirror and emits the full
//!   snapshot the inbox reconciler expects. Documents the app marked read
//!   leave the mirror at once, without waiting for the backend to confirm.
//! - Tracks the last known message count of each live room subscription and
//!   emits count deltas.
//! - Drops batches for subscriptions that were torn down or superseded.
//!   Teardown never waits for in-flight batches; they are discarded when they
//!   arrive.

use std::collections::HashMap;

use huddle_core::{InboxRecord, RoomId};

use crate::{AppAction, AppEvent, ChangeKind, DocChange, StreamBatch, SubscriptionId};

/// Known state of one live message subscription.
#[derive(Debug, Clone, Copy)]
struct LiveSubscription {
    generation: u64,
    /// `None` until the first notification establishes a baseline.
    known_count: Option<u64>,
}

/// Bridge between the stream adapter and App state.
#[derive(Debug, Default)]
pub struct Bridge {
    /// Inbox documents in first-arrival order.
    inbox_docs: Vec<InboxRecord>,
    /// Live message subscriptions keyed by room.
    subscriptions: HashMap<RoomId, LiveSubscription>,
}

impl Bridge {
    /// Create a bridge with empty mirrors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the bridge-side effect of an App action.
    ///
    /// Subscription actions open or tear down the matching mirror and inbox
    /// deletes drop the read documents; every other action passes through
    /// untouched.
    pub fn process_app_action(&mut self, action: &AppAction) {
        match action {
            AppAction::Subscribe { subscription } => self.subscribe(subscription),
            AppAction::Unsubscribe { subscription } => self.unsubscribe(subscription),
            AppAction::DeleteInbox { room_id, timestamp_keys } => self.mark_read(room_id, timestamp_keys),
            AppAction::UnsubscribeInbox => self.inbox_docs.clear(),
            AppAction::Render
            | AppAction::Quit
            | AppAction::PersistRoom { .. }
            | AppAction::SubscribeInbox { .. } => {},
        }
    }

    /// Drop mirrored inbox documents of `room_id` received at any of
    /// `timestamp_keys`.
    ///
    /// Later snapshots no longer carry them, whether or not the backend
    /// confirms the removal.
    pub fn mark_read(&mut self, room_id: &RoomId, timestamp_keys: &[String]) {
        let before = self.inbox_docs.len();
        self.inbox_docs.retain(|doc| {
            doc.room_id.as_deref() != Some(room_id.as_str())
                || !doc.timestamp.as_ref().is_some_and(|ts| timestamp_keys.contains(ts))
        });
        tracing::trace!(%room_id, dropped = before - self.inbox_docs.len(), "inbox documents marked read");
    }

    /// Register a room subscription, replacing any older generation.
    pub fn subscribe(&mut self, subscription: &SubscriptionId) {
        self.subscriptions.insert(
            subscription.room_id.clone(),
            LiveSubscription { generation: subscription.generation, known_count: None },
        );
    }

    /// Tear down a room subscription.
    ///
    /// Only the matching generation is removed, so a late teardown of an old
    /// subscription cannot cancel its replacement.
    pub fn unsubscribe(&mut self, subscription: &SubscriptionId) {
        if self.is_live(subscription) {
            self.subscriptions.remove(&subscription.room_id);
        }
    }

    /// Check if `subscription` is the room's current subscription.
    pub fn is_live(&self, subscription: &SubscriptionId) -> bool {
        self.subscriptions
            .get(&subscription.room_id)
            .is_some_and(|live| live.generation == subscription.generation)
    }

    /// Number of inbox documents mirrored.
    pub fn inbox_len(&self) -> usize {
        self.inbox_docs.len()
    }

    /// Drop every mirror.
    pub fn reset(&mut self) {
        self.inbox_docs.clear();
        self.subscriptions.clear();
    }

    /// Translate one stream batch into App events.
    pub fn process_batch(&mut self, batch: StreamBatch) -> Vec<AppEvent> {
        match batch {
            StreamBatch::Inbox { changes } => {
                for change in changes {
                    self.apply_inbox_change(change);
                }
                vec![AppEvent::InboxSnapshot { records: self.inbox_docs.clone() }]
            },
            StreamBatch::Messages { subscription, message_count } => {
                self.process_message_count(&subscription, message_count).into_iter().collect()
            },
        }
    }

    fn apply_inbox_change(&mut self, change: DocChange<InboxRecord>) {
        let DocChange { kind, doc } = change;
        let position = self.inbox_docs.iter().position(|d| d.doc_id == doc.doc_id);

        match (kind, position) {
            (ChangeKind::Added | ChangeKind::Modified, Some(index)) => self.inbox_docs[index] = doc,
            (ChangeKind::Added | ChangeKind::Modified, None) => self.inbox_docs.push(doc),
            (ChangeKind::Removed, Some(index)) => {
                self.inbox_docs.remove(index);
            },
            (ChangeKind::Removed, None) => {
                tracing::trace!(doc_id = %doc.doc_id, "removal of unknown inbox document");
            },
        }
    }

    fn process_message_count(
        &mut self,
        subscription: &SubscriptionId,
        message_count: u64,
    ) -> Option<AppEvent> {
        let Some(live) = self
            .subscriptions
            .get_mut(&subscription.room_id)
            .filter(|live| live.generation == subscription.generation)
        else {
            tracing::debug!(
                room_id = %subscription.room_id,
                generation = subscription.generation,
                "batch for stale subscription dropped"
            );
            return None;
        };

        let previous = live.known_count.replace(message_count);
        let old_count = previous?;
        if old_count == message_count {
            return None;
        }

        Some(AppEvent::MessagesDelivered {
            room_id: subscription.room_id.clone(),
            old_count,
            new_count: message_count,
        })
    }
}
