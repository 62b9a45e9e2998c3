//! Environment abstraction for deterministic testing.
//!
//! Decouples bookkeeping from the wall clock. Production code reads system
//! time; simulation advances a virtual clock by hand so `created_at` values
//! are reproducible.

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Abstract environment providing time.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}
