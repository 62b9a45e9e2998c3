//! Operations for model-based testing.
//!
//! Operations represent everything a user or the other side of a
//! conversation can do. They are generated randomly by proptest (or a fuzzer)
//! and applied to both the model and the real implementation.

use arbitrary::Arbitrary;
use huddle_core::UserId;

/// Number of distinct peers the local user can talk to.
pub const PEER_COUNT: u8 = 4;

/// Id of the local user in model runs.
pub const LOCAL_USER: &str = "me";

/// Peer identifier (reduced modulo [`PEER_COUNT`]).
pub type PeerId = u8;

/// User id of a model peer.
pub fn peer_user(peer: PeerId) -> UserId {
    UserId::new(format!("p{}", peer % PEER_COUNT))
}

/// Operations that can be applied to the system.
///
/// Operations are designed to be small and composable so proptest can
/// explore interesting combinations.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Local user opens the room with a peer.
    OpenRoom {
        /// Peer to talk to.
        peer: PeerId,
    },

    /// Local user closes the room with a peer.
    CloseRoom {
        /// Peer whose tab is closed.
        peer: PeerId,
    },

    /// Local user shows or hides the room list.
    ShowRooms {
        /// New visibility.
        visible: bool,
    },

    /// A peer sends the local user a message.
    ///
    /// Grows the room's message count and leaves an inbox entry.
    ReceiveMessage {
        /// Sender.
        peer: PeerId,
        /// Receive timestamp (small range to provoke duplicates).
        timestamp: u8,
    },

    /// Local user signs in (no-op if already signed in).
    SignIn,

    /// Local user signs out.
    SignOut,

    /// Advance simulation time.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },
}

impl Operation {
    /// Timestamp key used for inbox documents.
    pub fn timestamp_key(timestamp: u8) -> String {
        format!("t{}", timestamp % 8)
    }
}

/// Result of applying an operation.
///
/// Used to compare model and real system behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation was rejected with an expected error.
    Error(OperationError),
}

/// Expected rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Intent requires a signed-in user.
    NotSignedIn,

    /// Room is not open.
    RoomNotOpen,
}
