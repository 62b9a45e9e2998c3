//! Observable application state types.
//!
//! Auth state, subscription handles and persistence records shared between
//! the [`crate::App`] state machine, the [`crate::Bridge`] and drivers.

use huddle_core::{Participant, RoomId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Authentication state as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No user signed in.
    #[default]
    SignedOut,
    /// A user is signed in.
    SignedIn {
        /// The local participant.
        user: Participant,
    },
}

/// Handle of one message-stream subscription.
///
/// A room is re-subscribed with a fresh generation every time it is opened
/// after a close, so batches from an earlier subscription can be told apart
/// and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId {
    /// Room whose message collection is watched.
    pub room_id: RoomId,
    /// Monotonically increasing per app instance.
    pub generation: u64,
}

/// Room document the persistence layer creates on first open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Derived room id.
    pub room_id: RoomId,
    /// Local user that opened the room first.
    pub creator_id: UserId,
    /// Both participants, creator first.
    pub participants: [UserId; 2],
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: Timestamp,
}
