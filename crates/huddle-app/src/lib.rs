//! Application layer for Huddle
//!
//! Pure state machines and generic runtime for the chat view state, enabling
//! deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: view state machine (room tabs, inbox, unread counts, auth)
//! - [`Bridge`]: stream boundary (collection mirrors, subscription teardown)
//! - [`stream_channel`]: message-passing channel from the stream adapter
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod config;
mod driver;
mod error;
mod event;
mod runtime;
mod state;
mod stream;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use config::{AppConfig, DEFAULT_CHANNEL_CAPACITY};
pub use driver::Driver;
pub use error::AppError;
pub use event::AppEvent;
pub use runtime::Runtime;
pub use state::{AuthState, RoomRecord, SubscriptionId};
pub use stream::{ChangeKind, DocChange, StreamBatch, StreamReceiver, StreamSender, stream_channel};
