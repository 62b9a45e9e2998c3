//! Replay clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use huddle_core::{Environment, Timestamp};

/// Clock for replays: a fixed start plus scripted advances.
///
/// Clones share the offset, so the driver can advance the clock the runtime
/// reads.
#[derive(Debug, Clone)]
pub struct ReplayClock {
    start: Timestamp,
    offset: Arc<AtomicU64>,
}

impl ReplayClock {
    /// Start at `start` milliseconds since the Unix epoch.
    pub fn starting_at(start: Timestamp) -> Self {
        Self { start, offset: Arc::new(AtomicU64::new(0)) }
    }

    /// Start at the current wall-clock time.
    pub fn system() -> Self {
        let start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        Self::starting_at(start)
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        let _ = self.offset.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for ReplayClock {
    fn now(&self) -> Timestamp {
        self.start.saturating_add(self.offset.load(Ordering::SeqCst))
    }
}
