//! In-memory backing store for simulation.
//!
//! `SimBackend` stands in for the document database and its change streams.
//! It applies the intents the app emits and answers with the
//! [`StreamBatch`]es a real stream adapter would deliver, so the full
//! App → intent → store → stream → Bridge → App loop runs without I/O.
//!
//! The store serves a single viewer: inbox and message streams are those of
//! whichever user last subscribed.

use std::collections::{BTreeMap, HashMap};

use huddle_app::{AppAction, DocChange, RoomRecord, StreamBatch, SubscriptionId};
use huddle_core::{InboxRecord, RoomId, UserId, derive_room_id};

/// Simulated document store with change streams.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    /// Persisted room documents.
    rooms: BTreeMap<RoomId, RoomRecord>,
    /// Inbox documents per recipient, in insertion order.
    inbox: BTreeMap<UserId, Vec<InboxRecord>>,
    /// Message collection size per room.
    message_counts: HashMap<RoomId, u64>,
    /// Live room subscriptions.
    room_subscriptions: HashMap<RoomId, SubscriptionId>,
    /// User whose inbox is being streamed.
    inbox_subscriber: Option<UserId>,
    /// Counter for generated document ids.
    next_doc: u64,
}

impl SimBackend {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an intent and return the batches it triggers.
    pub fn apply(&mut self, action: &AppAction) -> Vec<StreamBatch> {
        match action {
            AppAction::PersistRoom { record } => {
                let _ = self.rooms.entry(record.room_id.clone()).or_insert_with(|| record.clone());
                vec![]
            },
            AppAction::DeleteInbox { room_id, timestamp_keys } => {
                self.delete_inbox(room_id, timestamp_keys)
            },
            AppAction::Subscribe { subscription } => {
                let _ = self
                    .room_subscriptions
                    .insert(subscription.room_id.clone(), subscription.clone());
                // A fresh listener is told the current size right away
                vec![StreamBatch::Messages {
                    subscription: subscription.clone(),
                    message_count: self.message_count(&subscription.room_id),
                }]
            },
            AppAction::Unsubscribe { subscription } => {
                if self.room_subscriptions.get(&subscription.room_id) == Some(subscription) {
                    let _ = self.room_subscriptions.remove(&subscription.room_id);
                }
                vec![]
            },
            AppAction::SubscribeInbox { user_id } => {
                self.inbox_subscriber = Some(user_id.clone());
                let changes = self
                    .inbox
                    .get(user_id)
                    .map(|docs| docs.iter().cloned().map(DocChange::added).collect())
                    .unwrap_or_default();
                vec![StreamBatch::Inbox { changes }]
            },
            AppAction::UnsubscribeInbox => {
                self.inbox_subscriber = None;
                vec![]
            },
            AppAction::Render | AppAction::Quit => vec![],
        }
    }

    /// Store a message from `from` to `to` and return the batches it
    /// triggers.
    ///
    /// The message grows the room's collection and leaves an inbox document
    /// for the recipient.
    pub fn send_message(
        &mut self,
        from: &UserId,
        to: &UserId,
        timestamp: impl Into<String>,
    ) -> Vec<StreamBatch> {
        let room_id = derive_room_id(from, to);
        let count = self.message_counts.entry(room_id.clone()).or_insert(0);
        *count += 1;
        let message_count = *count;

        let doc_id = self.next_doc_id();
        let record = InboxRecord::new(doc_id, room_id.as_str(), timestamp, from.as_str());

        let mut batches = Vec::new();
        if let Some(subscription) = self.room_subscriptions.get(&room_id) {
            batches.push(StreamBatch::Messages { subscription: subscription.clone(), message_count });
        }
        batches.extend(self.insert_inbox(to, record));
        batches
    }

    /// Store a raw inbox document for `to`, well-formed or not.
    pub fn insert_inbox(&mut self, to: &UserId, record: InboxRecord) -> Option<StreamBatch> {
        self.inbox.entry(to.clone()).or_default().push(record.clone());
        (self.inbox_subscriber.as_ref() == Some(to))
            .then(|| StreamBatch::Inbox { changes: vec![DocChange::added(record)] })
    }

    fn delete_inbox(&mut self, room_id: &RoomId, timestamp_keys: &[String]) -> Vec<StreamBatch> {
        let Some(user_id) = self.inbox_subscriber.clone() else {
            tracing::debug!(%room_id, "inbox delete without subscriber");
            return vec![];
        };
        let Some(docs) = self.inbox.get_mut(&user_id) else {
            return vec![];
        };

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(docs).into_iter().partition(|doc| {
            doc.room_id.as_deref() == Some(room_id.as_str())
                && doc.timestamp.as_ref().is_some_and(|ts| timestamp_keys.contains(ts))
        });
        *docs = kept;

        if removed.is_empty() {
            return vec![];
        }
        vec![StreamBatch::Inbox { changes: removed.into_iter().map(DocChange::removed).collect() }]
    }

    fn next_doc_id(&mut self) -> String {
        self.next_doc += 1;
        format!("doc{}", self.next_doc)
    }

    /// Persisted room documents.
    pub fn rooms(&self) -> &BTreeMap<RoomId, RoomRecord> {
        &self.rooms
    }

    /// Inbox documents stored for `user_id`.
    pub fn inbox_docs(&self, user_id: &UserId) -> &[InboxRecord] {
        self.inbox.get(user_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Messages stored in `room_id`.
    pub fn message_count(&self, room_id: &RoomId) -> u64 {
        self.message_counts.get(room_id).copied().unwrap_or(0)
    }

    /// Check if `room_id` has a live subscription.
    pub fn is_subscribed(&self, room_id: &RoomId) -> bool {
        self.room_subscriptions.contains_key(room_id)
    }
}
