//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use huddle_core::Timestamp;

use crate::{App, AppAction, StreamBatch};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production and simulation.
///
/// # Implementations
///
/// - **Replay CLI**: Reads a script of user actions and stream batches
/// - **Simulation**: Injected events, recorded intents, failure injection
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Apply the next user or auth input to `app`, if any.
    ///
    /// Returns the actions produced, or an empty vector if nothing was
    /// pending.
    fn poll_event(
        &mut self,
        app: &mut App,
        now: Timestamp,
    ) -> impl Future<Output = Result<Vec<AppAction>, Self::Error>> + Send;

    /// Receive the next stream batch.
    ///
    /// Returns `None` if no batch is ready.
    fn recv_batch(&mut self) -> impl Future<Output = Option<StreamBatch>> + Send;

    /// Hand an intent to the persistence or subscription layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the intent. The runtime
    /// surfaces it and keeps local state.
    fn execute(&mut self, action: &AppAction) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release subscriptions and clean up resources.
    fn stop(&mut self);
}
