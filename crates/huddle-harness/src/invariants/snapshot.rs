//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of one or more apps at a point in
//! time. Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::{BTreeMap, BTreeSet};

use huddle_app::App;
use huddle_core::{RoomId, UserId};
use serde::Serialize;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Snapshot every app in `apps`.
    pub fn from_apps<'a>(apps: impl IntoIterator<Item = &'a App>) -> Self {
        Self { clients: apps.into_iter().map(ClientSnapshot::from_app).collect() }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientSnapshot {
    /// Signed-in user. `None` if signed out.
    pub user_id: Option<UserId>,
    /// Open room tabs in order.
    pub sessions: Vec<SessionSnapshot>,
    /// Room list visibility.
    pub show_rooms: bool,
    /// Non-zero unread counts.
    pub unread: BTreeMap<RoomId, u64>,
    /// Number of inbox entries per room.
    pub inbox: BTreeMap<RoomId, usize>,
    /// Rooms with a live message subscription.
    pub subscriptions: BTreeSet<RoomId>,
}

impl ClientSnapshot {
    /// Create a snapshot for a signed-in user with no rooms.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: Some(UserId::new(user_id)), ..Default::default() }
    }

    /// Extract the observable state of `app`.
    pub fn from_app(app: &App) -> Self {
        let sessions = app
            .sessions()
            .iter()
            .map(|s| SessionSnapshot {
                room_id: s.room_id.clone(),
                other_user_id: s.other_user_id.clone(),
                is_opened: s.is_opened,
                active: s.active,
            })
            .collect();

        let unread = app
            .unread()
            .counts()
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(room_id, count)| (room_id.clone(), *count))
            .collect();

        let inbox = app
            .inbox()
            .messages()
            .map(|map| map.iter().map(|(room_id, entries)| (room_id.clone(), entries.len())).collect())
            .unwrap_or_default();

        Self {
            user_id: app.local_user_id().cloned(),
            sessions,
            show_rooms: app.show_rooms(),
            unread,
            inbox,
            subscriptions: app.subscriptions().keys().cloned().collect(),
        }
    }

    /// Add a session.
    #[must_use]
    pub fn with_session(mut self, session: SessionSnapshot) -> Self {
        self.subscriptions.insert(session.room_id.clone());
        self.sessions.push(session);
        self
    }

    /// Set an unread count.
    #[must_use]
    pub fn with_unread(mut self, room_id: impl Into<String>, count: u64) -> Self {
        self.unread.insert(RoomId::new(room_id), count);
        self
    }

    /// Set the number of inbox entries for a room.
    #[must_use]
    pub fn with_inbox(mut self, room_id: impl Into<String>, entries: usize) -> Self {
        self.inbox.insert(RoomId::new(room_id), entries);
        self
    }

    /// Currently active rooms. Healthy state has at most one.
    pub fn active_rooms(&self) -> impl Iterator<Item = &RoomId> {
        self.sessions.iter().filter(|s| s.active).map(|s| &s.room_id)
    }
}

/// Snapshot of one open room tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Room identifier.
    pub room_id: RoomId,
    /// The other participant.
    pub other_user_id: UserId,
    /// Tab is open.
    pub is_opened: bool,
    /// Room is on screen.
    pub active: bool,
}

impl SessionSnapshot {
    /// Open, inactive tab.
    pub fn open(room_id: impl Into<String>, other_user_id: impl Into<String>) -> Self {
        Self {
            room_id: RoomId::new(room_id),
            other_user_id: UserId::new(other_user_id),
            is_opened: true,
            active: false,
        }
    }

    /// Mark the tab active.
    #[must_use]
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use huddle_app::{AppConfig, AppEvent};
    use huddle_core::Participant;

    use super::*;

    #[test]
    fn empty_snapshot() {
        let snapshot = SystemSnapshot::empty();
        assert!(snapshot.clients.is_empty());
    }

    #[test]
    fn client_snapshot_builder() {
        let client = ClientSnapshot::new("u1")
            .with_session(SessionSnapshot::open("roomu1u2", "u2").active())
            .with_unread("roomu1u3", 4);

        assert_eq!(client.active_rooms().count(), 1);
        assert!(client.subscriptions.contains(&RoomId::new("roomu1u2")));
        assert_eq!(client.unread[&RoomId::new("roomu1u3")], 4);
    }

    #[test]
    fn from_app_captures_sessions() {
        let mut app = App::new(AppConfig::default());
        let _ = app.handle(AppEvent::SignedIn { user: Participant::new("u1", "Una") });
        let _ = app.open_room(Participant::new("u2", "Ugo"), 5);

        let client = ClientSnapshot::from_app(&app);
        assert_eq!(client.user_id, Some(UserId::new("u1")));
        assert_eq!(client.sessions, vec![SessionSnapshot::open("roomu1u2", "u2").active()]);
        assert!(client.show_rooms);
        assert!(client.inbox.is_empty());
    }
}
