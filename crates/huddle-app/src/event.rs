//! Application input events.
//!
//! This module defines [`AppEvent`], the notifications that drive the
//! [`crate::App`] state machine. User intents (open, close, show rooms) are
//! methods on `App` instead.
//!
//! Events originate from two distinct sources:
//! - The auth collaborator (sign-in and sign-out).
//! - Stream batches normalized by the [`crate::Bridge`].

use huddle_core::{InboxRecord, Participant, RoomId};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A user signed in.
    SignedIn {
        /// The local participant.
        user: Participant,
    },

    /// The user signed out; all local state is dropped.
    SignedOut,

    /// Full current inbox snapshot.
    InboxSnapshot {
        /// Every inbox document, in arrival order.
        records: Vec<InboxRecord>,
    },

    /// A room's message count changed.
    MessagesDelivered {
        /// Room whose count changed.
        room_id: RoomId,
        /// Previously known count.
        old_count: u64,
        /// Count reported now.
        new_count: u64,
    },

    /// Error reported by the persistence or network layer.
    Error {
        /// Error description.
        message: String,
    },
}
