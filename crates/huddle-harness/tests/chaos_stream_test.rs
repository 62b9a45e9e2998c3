//! Chaos property tests for the stream boundary.
//!
//! These tests verify that App and Bridge maintain invariants even when the
//! change stream is noisy:
//! - Duplicate inbox documents collapse to one entry per timestamp
//! - Malformed inbox documents are dropped without disturbing the rest
//! - Notifications on stale generations never touch unread counts

use std::collections::BTreeSet;

use huddle_app::AppConfig;
use huddle_core::derive_room_id;
use huddle_harness::{
    ChaosConfig, ChaosStream, InvariantRegistry, Operation, SimEnv, SimWorld, peer_user,
};
use proptest::prelude::*;

/// A signed-in world with rooms open for peers 0 and 1; peer 1 on screen.
fn world_with_rooms() -> SimWorld {
    let mut world = SimWorld::new(SimEnv::default(), AppConfig::default());
    for op in [Operation::SignIn, Operation::OpenRoom { peer: 0 }, Operation::OpenRoom { peer: 1 }] {
        let _ = world.apply(&op);
    }
    world
}

#[test]
fn prop_inbox_chaos_keeps_one_entry_per_timestamp() {
    proptest!(|(
        rate in 0.0..=1.0f64,
        seed in any::<u64>(),
        deliveries in prop::collection::vec((0u8..4, 0u8..10), 1..40),
    )| {
        let mut world = world_with_rooms();
        let mut chaos = ChaosStream::with_seed(ChaosConfig::uniform(rate), seed);
        let invariants = InvariantRegistry::standard();
        let local = world.local_user().clone();
        let active = world.app().active_room().cloned();

        let mut expected: BTreeSet<(String, String)> = BTreeSet::new();
        for (peer, timestamp) in deliveries {
            let room_id = derive_room_id(&local, &peer_user(peer));
            let timestamp = format!("t{timestamp}");
            world.deliver([chaos.inbox_batch(&room_id, &peer_user(peer), &timestamp)]);

            if Some(&room_id) != active.as_ref() {
                let _ = expected.insert((room_id.0, timestamp));
            }
            invariants.assert_all(&world.snapshot(), "after chaotic inbox batch");
        }

        // ORACLE: exactly the distinct (room, timestamp) pairs off screen
        let actual: BTreeSet<(String, String)> = world
            .app()
            .inbox()
            .messages()
            .into_iter()
            .flat_map(|map| map.values())
            .flat_map(|entries| entries.values())
            .map(|entry| (entry.room_id.0.clone(), entry.timestamp_key.clone()))
            .collect();
        prop_assert_eq!(actual, expected);
    });
}

#[test]
fn prop_stale_notifications_never_count() {
    proptest!(|(
        seed in any::<u64>(),
        counts in prop::collection::vec(0u64..30, 1..30),
    )| {
        let mut world = world_with_rooms();
        let mut chaos = ChaosStream::with_seed(ChaosConfig { stale_rate: 0.5, ..ChaosConfig::CALM }, seed);
        let background = derive_room_id(world.local_user(), &peer_user(0));
        let live = world.app().subscription(&background).cloned().unwrap();

        // Backend baseline from the subscribe is 0
        let mut known = 0u64;
        let mut expected = 0u64;
        for count in counts {
            let stale_before = chaos.stats().stale;
            let batch = chaos.message_batch(&live, count);
            let stale = chaos.stats().stale > stale_before;
            world.deliver([batch]);

            if !stale {
                expected += count.saturating_sub(known);
                known = count;
            }
        }

        // ORACLE: only live notifications moved the counter
        prop_assert_eq!(world.app().unread().get(&background), expected);
    });
}
