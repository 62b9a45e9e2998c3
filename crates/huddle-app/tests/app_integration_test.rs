//! Integration tests for App and Bridge behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - App state reflects the expected rooms and active room
//! - Inbox and unread bookkeeping agree with what was delivered
//! - Intents emitted for the persistence layer are the expected ones

use huddle_app::{App, AppAction, AppConfig, AppEvent, Bridge, DocChange, StreamBatch};
use huddle_core::{InboxRecord, Participant, RoomId, derive_room_id};

/// Create a signed-in App ready for testing.
fn signed_in_app(user: &str) -> App {
    let mut app = App::new(AppConfig::default());
    app.handle(AppEvent::SignedIn { user: Participant::new(user, user.to_uppercase()) });
    app
}

/// Apply the bridge-side effect of every action and return the intents.
fn process_actions(bridge: &mut Bridge, actions: Vec<AppAction>) -> Vec<AppAction> {
    let mut intents = Vec::new();
    for action in actions {
        bridge.process_app_action(&action);
        if action.is_intent() {
            intents.push(action);
        }
    }
    intents
}

/// Open a room through the App API and process through Bridge.
fn open_room(app: &mut App, bridge: &mut Bridge, other: &str) -> Vec<AppAction> {
    let actions = app.open_room(Participant::new(other, other.to_uppercase()), 1_000);
    process_actions(bridge, actions)
}

/// Close a room through the App API and process through Bridge.
fn close_room(app: &mut App, bridge: &mut Bridge, room_id: &RoomId) -> Vec<AppAction> {
    let actions = app.close_room(room_id);
    process_actions(bridge, actions)
}

/// Simulate receiving a batch from the stream adapter.
fn receive(app: &mut App, bridge: &mut Bridge, batch: StreamBatch) -> Vec<AppAction> {
    let mut intents = Vec::new();
    for event in bridge.process_batch(batch) {
        let actions = app.handle(event);
        intents.extend(process_actions(bridge, actions));
    }
    intents
}

/// Message-count batch on the app's current subscription of `room_id`.
fn count_batch(app: &App, room_id: &RoomId, message_count: u64) -> StreamBatch {
    let subscription = app.subscription(room_id).cloned().unwrap();
    StreamBatch::Messages { subscription, message_count }
}

fn room(a: &str, b: &str) -> RoomId {
    derive_room_id(&a.into(), &b.into())
}

#[test]
fn both_parties_derive_the_same_room() {
    let mut alice = signed_in_app("alice");
    let mut alice_bridge = Bridge::new();
    let mut bob = signed_in_app("bob");
    let mut bob_bridge = Bridge::new();

    let alice_intents = open_room(&mut alice, &mut alice_bridge, "bob");
    let bob_intents = open_room(&mut bob, &mut bob_bridge, "alice");

    let persisted = |intents: &[AppAction]| {
        intents.iter().find_map(|a| match a {
            AppAction::PersistRoom { record } => Some(record.room_id.clone()),
            _ => None,
        })
    };

    // Oracle: both sides persist the same room document id
    assert_eq!(persisted(&alice_intents), Some(RoomId::new("roomalicebob")));
    assert_eq!(persisted(&alice_intents), persisted(&bob_intents));
}

#[test]
fn unread_accrues_only_for_background_rooms() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");
    let r3 = room("u1", "u3");

    open_room(&mut app, &mut bridge, "u2");
    open_room(&mut app, &mut bridge, "u3");

    // Baselines
    let batch = count_batch(&app, &r2, 3);
    receive(&mut app, &mut bridge, batch);
    let batch = count_batch(&app, &r3, 7);
    receive(&mut app, &mut bridge, batch);

    let batch = count_batch(&app, &r2, 5);
    receive(&mut app, &mut bridge, batch);
    let batch = count_batch(&app, &r3, 9);
    receive(&mut app, &mut bridge, batch);

    // Oracle: r3 is on screen, r2 is not
    assert_eq!(app.active_room(), Some(&r3));
    assert_eq!(app.unread().get(&r2), 2);
    assert_eq!(app.unread().get(&r3), 0);

    open_room(&mut app, &mut bridge, "u2");
    assert_eq!(app.unread().total(), 0);
}

#[test]
fn late_batch_after_close_is_ignored() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    open_room(&mut app, &mut bridge, "u2");
    open_room(&mut app, &mut bridge, "u3");
    let stale = app.subscription(&r2).cloned().unwrap();
    let batch = count_batch(&app, &r2, 1);
    receive(&mut app, &mut bridge, batch);

    let intents = close_room(&mut app, &mut bridge, &r2);
    assert!(intents.contains(&AppAction::Unsubscribe { subscription: stale.clone() }));

    receive(&mut app, &mut bridge, StreamBatch::Messages { subscription: stale, message_count: 50 });

    // Oracle: nothing accrued for the closed room
    assert_eq!(app.unread().get(&r2), 0);
    assert!(app.sessions().iter().all(|s| s.room_id != r2));
}

#[test]
fn reopened_room_ignores_previous_generation() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    open_room(&mut app, &mut bridge, "u2");
    let first = app.subscription(&r2).cloned().unwrap();
    close_room(&mut app, &mut bridge, &r2);
    open_room(&mut app, &mut bridge, "u2");
    open_room(&mut app, &mut bridge, "u3");

    let batch = count_batch(&app, &r2, 1);
    receive(&mut app, &mut bridge, batch);
    receive(&mut app, &mut bridge, StreamBatch::Messages { subscription: first, message_count: 40 });
    let batch = count_batch(&app, &r2, 2);
    receive(&mut app, &mut bridge, batch);

    // Oracle: only the live generation counted
    assert_eq!(app.unread().get(&r2), 1);
}

#[test]
fn inbox_flow_dedups_and_clears_on_open() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    let batch = StreamBatch::Inbox {
        changes: vec![
            DocChange::added(InboxRecord::new("d1", r2.as_str(), "t1", "u2").with_field("text", "hi")),
            DocChange::added(InboxRecord::new("d2", r2.as_str(), "t1", "u2").with_field("text", "dup")),
            DocChange::added(InboxRecord::new("d3", r2.as_str(), "t2", "u2")),
            DocChange::added(InboxRecord { doc_id: "bad".into(), ..Default::default() }),
        ],
    };
    receive(&mut app, &mut bridge, batch);

    // Oracle: first write kept, malformed dropped
    let entries = app.inbox().room(&r2).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries["t1"].payload["text"], "hi");
    assert_eq!(bridge.inbox_len(), 4);

    let intents = open_room(&mut app, &mut bridge, "u2");
    assert!(intents.contains(&AppAction::DeleteInbox {
        room_id: r2.clone(),
        timestamp_keys: vec!["t1".into(), "t2".into()],
    }));
    assert!(app.inbox().messages().is_none());
    // Only the malformed document is still mirrored
    assert_eq!(bridge.inbox_len(), 1);
}

#[test]
fn read_room_stays_read_after_unrelated_inbox_change() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");
    let r4 = room("u1", "u4");

    open_room(&mut app, &mut bridge, "u2");
    let intents = receive(&mut app, &mut bridge, StreamBatch::Inbox {
        changes: vec![DocChange::added(InboxRecord::new("d1", r2.as_str(), "t1", "u2"))],
    });
    assert_eq!(intents, vec![AppAction::DeleteInbox { room_id: r2.clone(), timestamp_keys: vec!["t1".into()] }]);

    open_room(&mut app, &mut bridge, "u3");
    let intents = receive(&mut app, &mut bridge, StreamBatch::Inbox {
        changes: vec![DocChange::added(InboxRecord::new("d2", r4.as_str(), "t2", "u4"))],
    });

    // Oracle: the read room does not come back and is not deleted twice
    let rooms: Vec<&RoomId> = app.inbox().messages().unwrap().keys().collect();
    assert_eq!(rooms, vec![&r4]);
    assert!(intents.is_empty());
}

#[test]
fn active_room_deletes_each_inbox_entry_once() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    open_room(&mut app, &mut bridge, "u2");
    let first = receive(&mut app, &mut bridge, StreamBatch::Inbox {
        changes: vec![DocChange::added(InboxRecord::new("d1", r2.as_str(), "t1", "u2"))],
    });
    let second = receive(&mut app, &mut bridge, StreamBatch::Inbox {
        changes: vec![DocChange::added(InboxRecord::new("d2", "roomu1u9", "t2", "u9"))],
    });

    let deletes = |intents: &[AppAction]| {
        intents.iter().filter(|a| matches!(a, AppAction::DeleteInbox { .. })).count()
    };
    assert_eq!(deletes(&first), 1);
    assert_eq!(deletes(&second), 0);
}

#[test]
fn closing_last_room_hides_list() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();

    open_room(&mut app, &mut bridge, "u2");
    assert!(app.show_rooms());

    close_room(&mut app, &mut bridge, &room("u1", "u2"));
    assert!(!app.show_rooms());
    assert!(app.sessions().is_empty());
    assert!(app.subscriptions().is_empty());
}

#[test]
fn show_rooms_toggle_requires_reselection() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    open_room(&mut app, &mut bridge, "u2");
    let batch = count_batch(&app, &r2, 1);
    receive(&mut app, &mut bridge, batch);

    app.set_show_rooms(false);
    app.set_show_rooms(true);
    assert!(app.active_room().is_none());

    // With nothing on screen, the room accrues unread again
    let batch = count_batch(&app, &r2, 4);
    receive(&mut app, &mut bridge, batch);
    assert_eq!(app.unread().get(&r2), 3);
}

#[test]
fn sign_out_drops_inbox_mirror_and_subscriptions() {
    let mut app = signed_in_app("u1");
    let mut bridge = Bridge::new();
    let r2 = room("u1", "u2");

    open_room(&mut app, &mut bridge, "u2");
    let subscription = app.subscription(&r2).cloned().unwrap();
    receive(&mut app, &mut bridge, StreamBatch::Inbox {
        changes: vec![DocChange::added(InboxRecord::new("d1", "roomu1u9", "t1", "u9"))],
    });

    let actions = app.handle(AppEvent::SignedOut);
    let intents = process_actions(&mut bridge, actions);

    assert!(intents.contains(&AppAction::UnsubscribeInbox));
    assert_eq!(bridge.inbox_len(), 0);
    assert!(!bridge.is_live(&subscription));
    assert!(app.inbox().messages().is_none());
}
