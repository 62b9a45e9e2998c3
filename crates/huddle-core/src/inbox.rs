//! Inbox reconciler.
//!
//! The backing store pushes the full set of unread-message notifications for
//! the local user on every change. [`Inbox::set_inbox`] rebuilds a two-level
//! map from each snapshot: room id first, then the string-formatted receive
//! time. Within one snapshot the first record for a `(room, timestamp)` pair
//! wins and later duplicates are dropped.
//!
//! "Nothing unread anywhere" is represented as `None`, never as an empty
//! map, and no room ever maps to an empty inner map. Callers branch on the
//! `None` to decide whether to show the inbox indicator.

use std::collections::{BTreeMap, btree_map::Entry};

use serde::{Deserialize, Serialize};

use crate::{RecordError, RoomId};

/// Opaque document fields the reconciler never interprets.
pub type Payload = BTreeMap<String, serde_json::Value>;

/// Raw inbox document as delivered by the stream adapter.
///
/// Field presence is not guaranteed; see [`InboxEntry::try_from`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxRecord {
    /// Backing-store document id.
    pub doc_id: String,
    /// Room the message was sent in.
    #[serde(default)]
    pub room_id: Option<String>,
    /// String-formatted receive time.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Sender id.
    #[serde(default)]
    pub messages_from: Option<String>,
    /// Remaining fields, carried through untouched.
    #[serde(flatten)]
    pub payload: Payload,
}

impl InboxRecord {
    /// Well-formed record for `room_id` received at `timestamp`.
    pub fn new(
        doc_id: impl Into<String>,
        room_id: impl Into<String>,
        timestamp: impl Into<String>,
        messages_from: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            room_id: Some(room_id.into()),
            timestamp: Some(timestamp.into()),
            messages_from: Some(messages_from.into()),
            payload: Payload::new(),
        }
    }

    /// Attach an opaque payload field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// One unread notification of a message sent to the local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    /// Room the message was sent in.
    pub room_id: RoomId,
    /// Receive time, used as dedup key within the room.
    pub timestamp_key: String,
    /// Sender id. Empty if the record did not name one.
    pub messages_from: String,
    /// Opaque payload fields.
    pub payload: Payload,
}

impl TryFrom<InboxRecord> for InboxEntry {
    type Error = RecordError;

    fn try_from(record: InboxRecord) -> Result<Self, Self::Error> {
        let InboxRecord { doc_id, room_id, timestamp, messages_from, payload } = record;

        let room_id = room_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RecordError::MissingField { doc_id: doc_id.clone(), field: "roomId" })?;
        let timestamp_key = timestamp
            .filter(|ts| !ts.is_empty())
            .ok_or(RecordError::MissingField { doc_id, field: "timestamp" })?;

        Ok(Self {
            room_id: RoomId(room_id),
            timestamp_key,
            messages_from: messages_from.unwrap_or_default(),
            payload,
        })
    }
}

/// Entries of one room keyed by timestamp.
pub type RoomInbox = BTreeMap<String, InboxEntry>;

/// All unread entries keyed by room.
pub type InboxMap = BTreeMap<RoomId, RoomInbox>;

/// Inbox reconciler state.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    messages: Option<InboxMap>,
}

impl Inbox {
    /// Create an inbox with nothing unread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the inbox with a fresh snapshot.
    ///
    /// `None` clears all state (sign-out). Records missing a room id or a
    /// timestamp are dropped. Prior state is discarded, not merged, so
    /// callers must pass the full current snapshot.
    pub fn set_inbox(&mut self, records: Option<Vec<InboxRecord>>) -> Option<&InboxMap> {
        let Some(records) = records else {
            self.messages = None;
            return None;
        };

        let mut map = InboxMap::new();
        for record in records {
            let entry = match InboxEntry::try_from(record) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "dropping malformed inbox record");
                    continue;
                },
            };

            let room = map.entry(entry.room_id.clone()).or_default();
            match room.entry(entry.timestamp_key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                },
                Entry::Occupied(_) => {
                    tracing::trace!(
                        room_id = %entry.room_id,
                        timestamp = %entry.timestamp_key,
                        "duplicate inbox entry dropped"
                    );
                },
            }
        }

        self.messages = if map.is_empty() { None } else { Some(map) };
        self.messages.as_ref()
    }

    /// Remove every entry of `room_id`.
    ///
    /// Returns the removed entries. Unknown rooms are a no-op returning
    /// `None`. Removing the last room resets the state to `None`.
    pub fn delete_inbox_messages(&mut self, room_id: &RoomId) -> Option<RoomInbox> {
        let map = self.messages.as_mut()?;
        let removed = map.remove(room_id)?;
        if map.is_empty() {
            self.messages = None;
        }
        Some(removed)
    }

    /// Current state. `None` if nothing is unread anywhere.
    pub fn messages(&self) -> Option<&InboxMap> {
        self.messages.as_ref()
    }

    /// Entries of one room. `None` if the room has none.
    pub fn room(&self, room_id: &RoomId) -> Option<&RoomInbox> {
        self.messages.as_ref().and_then(|map| map.get(room_id))
    }

    /// Check if `room_id` has unread entries.
    pub fn has_unread(&self, room_id: &RoomId) -> bool {
        self.room(room_id).is_some()
    }

    /// Number of entries across all rooms.
    pub fn total_entries(&self) -> usize {
        self.messages.as_ref().map_or(0, |map| map.values().map(BTreeMap::len).sum())
    }
}
