//! Chaotic stream batches for fault injection testing.
//!
//! Real change streams deliver duplicates, half-written documents and
//! notifications for listeners that were already torn down. `ChaosStream`
//! wraps well-formed deliveries and randomly mixes in that noise so tests can
//! check the reconcilers stay consistent under it.

use huddle_app::{DocChange, StreamBatch, SubscriptionId};
use huddle_core::{InboxRecord, RoomId, UserId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Probabilities of each kind of noise, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaosConfig {
    /// Chance of an extra document repeating a (room, timestamp) pair.
    pub duplicate_rate: f64,
    /// Chance of an extra document missing a required field.
    pub malformed_rate: f64,
    /// Chance a message notification carries an old generation.
    pub stale_rate: f64,
}

impl ChaosConfig {
    /// No noise at all.
    pub const CALM: Self = Self { duplicate_rate: 0.0, malformed_rate: 0.0, stale_rate: 0.0 };

    /// Every rate set to `rate`.
    pub fn uniform(rate: f64) -> Self {
        Self { duplicate_rate: rate, malformed_rate: rate, stale_rate: rate }
    }

    fn validate(&self) {
        for (name, rate) in [
            ("duplicate_rate", self.duplicate_rate),
            ("malformed_rate", self.malformed_rate),
            ("stale_rate", self.stale_rate),
        ] {
            assert!((0.0..=1.0).contains(&rate), "{name} must be between 0.0 and 1.0, got {rate}");
        }
    }
}

/// Counts of the noise injected so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChaosStats {
    /// Duplicate documents added.
    pub duplicates: u64,
    /// Malformed documents added.
    pub malformed: u64,
    /// Notifications sent on a stale generation.
    pub stale: u64,
}

/// Seeded generator of noisy stream batches.
#[derive(Debug, Clone)]
pub struct ChaosStream {
    rng: ChaCha8Rng,
    config: ChaosConfig,
    next_doc: u64,
    stats: ChaosStats,
}

impl ChaosStream {
    /// Create with explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if any rate is outside `[0.0, 1.0]`.
    pub fn with_seed(config: ChaosConfig, seed: u64) -> Self {
        config.validate();
        Self { rng: ChaCha8Rng::seed_from_u64(seed), config, next_doc: 0, stats: ChaosStats::default() }
    }

    /// Noise injected so far.
    pub fn stats(&self) -> ChaosStats {
        self.stats
    }

    /// Inbox batch adding one well-formed document, plus noise.
    pub fn inbox_batch(&mut self, room_id: &RoomId, from: &UserId, timestamp: &str) -> StreamBatch {
        let mut changes = vec![DocChange::added(self.record(room_id, from, timestamp))];

        if self.rng.gen_bool(self.config.duplicate_rate) {
            self.stats.duplicates += 1;
            let duplicate = self.record(room_id, from, timestamp).with_field("text", "duplicate");
            changes.push(DocChange::added(duplicate));
        }

        if self.rng.gen_bool(self.config.malformed_rate) {
            self.stats.malformed += 1;
            let mut broken = self.record(room_id, from, timestamp);
            match self.rng.gen_range(0..3) {
                0 => broken.room_id = None,
                1 => broken.timestamp = None,
                _ => broken.room_id = Some(String::new()),
            }
            changes.push(DocChange::added(broken));
        }

        // Stream order is not creation order
        if changes.len() > 1 && self.rng.gen_bool(0.5) {
            changes.reverse();
        }
        StreamBatch::Inbox { changes }
    }

    /// Message-count notification for `live`, possibly on a stale generation.
    pub fn message_batch(&mut self, live: &SubscriptionId, message_count: u64) -> StreamBatch {
        let mut subscription = live.clone();
        if live.generation > 0 && self.rng.gen_bool(self.config.stale_rate) {
            self.stats.stale += 1;
            subscription.generation = self.rng.gen_range(0..live.generation);
        }
        StreamBatch::Messages { subscription, message_count }
    }

    fn record(&mut self, room_id: &RoomId, from: &UserId, timestamp: &str) -> InboxRecord {
        self.next_doc += 1;
        InboxRecord::new(format!("chaos{}", self.next_doc), room_id.as_str(), timestamp, from.as_str())
    }
}
