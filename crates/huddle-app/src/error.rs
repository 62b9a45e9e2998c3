//! Application layer errors.
//!
//! None of these are fatal. Rejected user intents become status messages;
//! channel errors are returned to whoever feeds the stream.

use huddle_core::UserId;
use thiserror::Error;

/// Errors produced by the application layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// A room was opened before sign-in
    #[error("not signed in")]
    NotSignedIn,

    /// Self-chat is disabled by configuration
    #[error("cannot open a room with yourself ({user_id})")]
    SelfChat {
        /// The local user
        user_id: UserId,
    },

    /// The stream receiver was dropped
    #[error("stream channel closed")]
    ChannelClosed,

    /// The stream channel is at capacity
    #[error("stream channel full")]
    ChannelFull,
}
