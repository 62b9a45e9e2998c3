//! Fuzz target for inbox document streams
//!
//! # Strategy
//!
//! - Arbitrary added, modified and removed documents with any subset of
//!   fields missing
//! - Room ids and timestamps drawn from a small alphabet so duplicates and
//!   collisions are common
//! - One room open and on screen while the stream runs
//!
//! # Invariants
//!
//! - NEVER panic on malformed documents
//! - At most one entry per (room, timestamp) pair
//! - The room on screen never holds inbox entries
//! - An empty inbox is reported as `None`

#![no_main]

use arbitrary::Arbitrary;
use huddle_app::{App, AppConfig, AppEvent, Bridge, ChangeKind, DocChange, StreamBatch};
use huddle_core::{InboxRecord, Participant, UserId, derive_room_id};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct FuzzDoc {
    doc: u8,
    kind: FuzzKind,
    room: Option<u8>,
    timestamp: Option<u8>,
    from: Option<u8>,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzKind {
    Added,
    Modified,
    Removed,
}

impl FuzzDoc {
    fn change(&self) -> DocChange<InboxRecord> {
        let kind = match self.kind {
            FuzzKind::Added => ChangeKind::Added,
            FuzzKind::Modified => ChangeKind::Modified,
            FuzzKind::Removed => ChangeKind::Removed,
        };
        let doc = InboxRecord {
            doc_id: format!("d{}", self.doc % 16),
            room_id: self.room.map(|r| derive_room_id(&UserId::new("me"), &UserId::new(format!("p{}", r % 4))).0),
            timestamp: self.timestamp.map(|t| format!("t{}", t % 8)),
            messages_from: self.from.map(|f| format!("p{}", f % 4)),
            ..InboxRecord::default()
        };
        DocChange { kind, doc }
    }
}

fuzz_target!(|batches: Vec<Vec<FuzzDoc>>| {
    let mut app = App::new(AppConfig::default());
    let mut bridge = Bridge::new();
    for action in app.handle(AppEvent::SignedIn { user: Participant::new("me", "Me") }) {
        bridge.process_app_action(&action);
    }
    for action in app.open_room(Participant::new("p0", "P0"), 0) {
        bridge.process_app_action(&action);
    }
    let active = derive_room_id(&UserId::new("me"), &UserId::new("p0"));

    for batch in batches.iter().take(64) {
        let changes = batch.iter().take(32).map(FuzzDoc::change).collect();
        for event in bridge.process_batch(StreamBatch::Inbox { changes }) {
            for action in app.handle(event) {
                bridge.process_app_action(&action);
            }
        }

        let Some(inbox) = app.inbox().messages() else {
            continue;
        };
        assert!(!inbox.is_empty(), "empty inbox must be None");
        assert!(!inbox.contains_key(&active), "room on screen holds inbox entries");
        for (room_id, entries) in inbox {
            assert!(!entries.is_empty(), "empty room entry in inbox");
            for (timestamp, entry) in entries {
                assert_eq!(&entry.room_id, room_id);
                assert_eq!(&entry.timestamp_key, timestamp);
            }
        }
    }
});
