//! Per-room unread counts.
//!
//! Counts messages that arrived for a room while it was not on screen. The
//! active room never accrues a count: its messages are read as they arrive,
//! and activating a room clears whatever it had.

use std::collections::HashMap;

use crate::RoomId;

/// Map from room id to messages received while inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    counts: HashMap<RoomId, u64>,
}

impl UnreadCounts {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message-count notification for `room_id`.
    ///
    /// Adds `new_count - old_count` unless the room is active. A shrinking
    /// count (messages deleted upstream) clamps to zero and never decrements.
    /// A zero delta leaves the map untouched, so no entry is ever created
    /// with a zero count.
    pub fn record_delivery(
        &mut self,
        room_id: &RoomId,
        active_room_id: Option<&RoomId>,
        old_count: u64,
        new_count: u64,
    ) -> &HashMap<RoomId, u64> {
        let delta = new_count.saturating_sub(old_count);
        if delta == 0 || active_room_id == Some(room_id) {
            return &self.counts;
        }

        *self.counts.entry(room_id.clone()).or_insert(0) += delta;
        tracing::trace!(%room_id, delta, "unread count increased");
        &self.counts
    }

    /// Remove the count of `room_id`. Called whenever the room becomes
    /// active.
    pub fn clear(&mut self, room_id: &RoomId) {
        self.counts.remove(room_id);
    }

    /// Remove every count.
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// Unread count of `room_id`, 0 if none.
    pub fn get(&self, room_id: &RoomId) -> u64 {
        self.counts.get(room_id).copied().unwrap_or(0)
    }

    /// All non-zero counts.
    pub fn counts(&self) -> &HashMap<RoomId, u64> {
        &self.counts
    }

    /// Sum over all rooms.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}
