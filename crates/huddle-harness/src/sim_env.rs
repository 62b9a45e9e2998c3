//! Virtual clock for deterministic simulation.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use huddle_core::{Environment, Timestamp};

/// Default start of the virtual clock (2023-11-14T22:13:20Z).
pub const DEFAULT_START: Timestamp = 1_700_000_000_000;

/// Simulation environment with a hand-advanced clock.
///
/// Clones share the same clock, so a test can keep a handle while the
/// runtime owns another.
#[derive(Debug, Clone)]
pub struct SimEnv {
    now: Arc<AtomicU64>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new(DEFAULT_START)
    }
}

impl SimEnv {
    /// Create a clock starting at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self { now: Arc::new(AtomicU64::new(start)) }
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        let _ = self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new(10);
        let handle = env.clone();

        handle.advance(5);
        assert_eq!(env.now(), 15);
    }
}
