//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.
//! Apart from `Render` and `Quit`, every action is an intent for the
//! persistence or subscription layer; the app never waits for its outcome.

use huddle_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};

use crate::{RoomRecord, SubscriptionId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Create the room document for a newly opened room.
    PersistRoom {
        /// Record to store.
        record: RoomRecord,
    },

    /// Delete inbox documents of a room that was read.
    DeleteInbox {
        /// Room whose entries were cleared.
        room_id: RoomId,
        /// Timestamp keys of the cleared entries.
        timestamp_keys: Vec<String>,
    },

    /// Start watching a room's message collection.
    Subscribe {
        /// Subscription to open.
        subscription: SubscriptionId,
    },

    /// Stop watching a room's message collection.
    Unsubscribe {
        /// Subscription to tear down.
        subscription: SubscriptionId,
    },

    /// Start watching the local user's inbox collection.
    SubscribeInbox {
        /// User whose inbox to watch.
        user_id: UserId,
    },

    /// Stop watching the inbox collection.
    UnsubscribeInbox,
}

impl AppAction {
    /// Check if this action must be handed to the persistence layer.
    pub fn is_intent(&self) -> bool {
        !matches!(self, Self::Render | Self::Quit)
    }
}
