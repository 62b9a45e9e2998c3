//! Reference model for model-based testing.
//!
//! Operations are applied to both the [`ModelWorld`] and the real App,
//! Bridge and backend; their observable states must match after every step.

mod operation;
mod world;

pub use operation::{
    LOCAL_USER, Operation, OperationError, OperationResult, PEER_COUNT, PeerId, peer_user,
};
pub use world::{ModelWorld, ObservableState};
