//! Huddle core
//!
//! Pure, synchronous bookkeeping for two-party chat rooms as seen by one
//! client. Nothing in this crate performs I/O: every operation is a total
//! state transition on `&mut self`, so an operation can never observe a
//! half-applied mutation of another.
//!
//! # Components
//!
//! - [`derive_room_id`]: canonical, order-independent room identifiers
//! - [`SessionStore`]: open room tabs and the single active room
//! - [`Inbox`]: first-write-wins reconciliation of pushed inbox snapshots
//! - [`UnreadCounts`]: per-room counts of messages missed while inactive
//! - [`Environment`]: clock abstraction for deterministic simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod error;
mod ids;
mod inbox;
mod session;
mod unread;

pub use env::{Environment, Timestamp};
pub use error::RecordError;
pub use ids::{Participant, ROOM_ID_PREFIX, RoomId, UserId, derive_room_id};
pub use inbox::{Inbox, InboxEntry, InboxMap, InboxRecord, Payload, RoomInbox};
pub use session::{CloseOutcome, OpenOutcome, RoomSession, SessionStore};
pub use unread::UnreadCounts;
