//! Deterministic simulation harness for Huddle view-state testing.
//!
//! Virtual-clock and in-memory implementations of the Environment, Driver and
//! backing store for deterministic, reproducible testing of the chat view
//! state under noisy change streams.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and a [`SimWorld`], and
//! their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! view-state invariants.
//!
//! # Chaos Testing
//!
//! [`ChaosStream`] produces seeded stream batches with duplicate, malformed
//! and stale deliveries mixed in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chaos;
pub mod invariants;
pub mod model;
pub mod sim_backend;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_world;

pub use chaos::{ChaosConfig, ChaosStats, ChaosStream};
pub use invariants::{
    ActiveRoomSettled, ClientSnapshot, Invariant, InvariantRegistry, InvariantResult,
    NoEmptyInboxRoom, RoomIdAgreement, SessionSnapshot, SignedOutIsEmpty, SingleActiveRoom,
    SubscriptionsMatchSessions, SystemSnapshot, UniqueSessions, Violation,
};
pub use model::{
    LOCAL_USER, ModelWorld, ObservableState, Operation, OperationError, OperationResult,
    PEER_COUNT, PeerId, peer_user,
};
pub use sim_backend::SimBackend;
pub use sim_driver::{SimDriver, SimDriverError, SimHandle, SimInput};
pub use sim_env::SimEnv;
pub use sim_world::SimWorld;
