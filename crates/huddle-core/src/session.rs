//! Room session store.
//!
//! Holds the room tabs the local user has open and decides which one is on
//! screen. The store owns two pieces of view state: the ordered session
//! collection and the "show rooms" visibility flag.
//!
//! # Invariants
//!
//! - At most one session has `active == true`.
//! - Activation always rewrites the flag of every session in one pass
//!   ([`SessionStore::activate_only`]); no code path toggles a single
//!   session's flag in isolation.
//! - Collection order is insertion order. Promotion after a close picks the
//!   first remaining opened session in that order.

use serde::{Deserialize, Serialize};

use crate::{Participant, RoomId, Timestamp, UserId, derive_room_id};

/// One two-party conversation as perceived by the local client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSession {
    /// Canonical id, immutable once created.
    pub room_id: RoomId,
    /// Local user at creation time.
    pub creator_id: UserId,
    /// The other participant.
    pub other_user_id: UserId,
    /// The other participant's display name(s).
    pub other_user_names: String,
    /// The other participant's profile image. `None` if unset.
    pub other_user_image: Option<String>,
    /// Room has a tab in the session list.
    pub is_opened: bool,
    /// Room is the one currently displayed.
    pub active: bool,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: Timestamp,
}

/// Result of [`SessionStore::open_room`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOutcome {
    /// Derived id of the opened room.
    pub room_id: RoomId,
    /// `true` if no session existed and one was constructed.
    pub created: bool,
}

/// Result of [`SessionStore::close_room`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseOutcome {
    /// The removed session. `None` if the id was unknown.
    pub removed: Option<RoomSession>,
    /// Session promoted to active because the active one was closed.
    pub promoted: Option<RoomId>,
}

/// In-memory collection of room sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Vec<RoomSession>,
    show_rooms: bool,
}

impl SessionStore {
    /// Create an empty store with the room list hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) the room between `local` and `other` and make it
    /// the only active session.
    ///
    /// An existing session keeps its id, creator and creation time; only the
    /// other participant's presentation is refreshed. Opening always makes
    /// the room list visible.
    pub fn open_room(
        &mut self,
        local: &UserId,
        other: &Participant,
        now: Timestamp,
    ) -> OpenOutcome {
        let room_id = derive_room_id(local, &other.id);
        let created = match self.position(&room_id) {
            Some(index) => {
                let session = &mut self.sessions[index];
                session.other_user_names.clone_from(&other.names);
                session.other_user_image.clone_from(&other.image);
                session.is_opened = true;
                false
            },
            None => {
                self.sessions.push(RoomSession {
                    room_id: room_id.clone(),
                    creator_id: local.clone(),
                    other_user_id: other.id.clone(),
                    other_user_names: other.names.clone(),
                    other_user_image: other.image.clone(),
                    is_opened: true,
                    active: true,
                    created_at: now,
                });
                true
            },
        };

        self.activate_only(&room_id);
        self.show_rooms = true;

        tracing::debug!(%room_id, created, "room opened");
        OpenOutcome { room_id, created }
    }

    /// Remove a session, promoting another if the active one went away.
    ///
    /// Unknown ids are a no-op. When no opened session remains the room list
    /// is hidden.
    pub fn close_room(&mut self, room_id: &RoomId) -> CloseOutcome {
        let Some(index) = self.position(room_id) else {
            return CloseOutcome::default();
        };
        let removed = self.sessions.remove(index);

        let mut promoted = None;
        if !self.sessions.iter().any(|s| s.active)
            && let Some(next) = self.sessions.iter().find(|s| s.is_opened).map(|s| s.room_id.clone())
        {
            self.activate_only(&next);
            promoted = Some(next);
        }
        if !self.sessions.iter().any(|s| s.is_opened) {
            self.show_rooms = false;
        }

        tracing::debug!(%room_id, promoted = ?promoted, "room closed");
        CloseOutcome { removed: Some(removed), promoted }
    }

    /// Show or hide the room list.
    ///
    /// Every call deactivates all sessions, so a stale active room never
    /// reappears when the list is shown again; the caller re-opens the room
    /// it wants on screen.
    pub fn set_show_rooms(&mut self, visible: bool) {
        self.show_rooms = visible;
        for session in &mut self.sessions {
            session.active = false;
        }
    }

    /// Make `room_id` the only active session.
    ///
    /// Rewrites the flag of every session, so the single-active invariant
    /// holds after the call whether or not `room_id` exists.
    pub fn activate_only(&mut self, room_id: &RoomId) {
        for session in &mut self.sessions {
            session.active = session.room_id == *room_id;
        }
    }

    /// Drop every session and hide the room list.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.show_rooms = false;
    }

    /// Sessions in insertion order.
    pub fn sessions(&self) -> &[RoomSession] {
        &self.sessions
    }

    /// Session for `room_id`. `None` if not open.
    pub fn get(&self, room_id: &RoomId) -> Option<&RoomSession> {
        self.sessions.iter().find(|s| s.room_id == *room_id)
    }

    /// Currently displayed room. `None` if no session is active.
    pub fn active_room_id(&self) -> Option<&RoomId> {
        self.sessions.iter().find(|s| s.active).map(|s| &s.room_id)
    }

    /// Room list visibility.
    pub fn show_rooms(&self) -> bool {
        self.show_rooms
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn position(&self, room_id: &RoomId) -> Option<usize> {
        self.sessions.iter().position(|s| s.room_id == *room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(store: &mut SessionStore, local: &str, other: &str) -> OpenOutcome {
        store.open_room(&UserId::new(local), &Participant::new(other, other.to_uppercase()), 10)
    }

    fn active_count(store: &SessionStore) -> usize {
        store.sessions().iter().filter(|s| s.active).count()
    }

    #[test]
    fn open_creates_active_session_and_shows_rooms() {
        let mut store = SessionStore::new();
        let outcome = open(&mut store, "u1", "u2");

        assert!(outcome.created);
        assert_eq!(outcome.room_id.as_str(), "roomu1u2");
        assert!(store.show_rooms());
        assert_eq!(store.active_room_id(), Some(&outcome.room_id));

        let session = &store.sessions()[0];
        assert!(session.is_opened);
        assert_eq!(session.creator_id.as_str(), "u1");
        assert_eq!(session.other_user_names, "U2");
        assert_eq!(session.created_at, 10);
    }

    #[test]
    fn open_from_either_side_reuses_session() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");
        let outcome = open(&mut store, "u2", "u1");

        assert!(!outcome.created);
        assert_eq!(store.len(), 1);
        assert_eq!(store.sessions()[0].room_id.as_str(), "roomu1u2");
    }

    #[test]
    fn reopen_refreshes_presentation_but_keeps_identity() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");

        let other = Participant::new("u2", "Renamed").with_image("u2.png");
        let _ = store.open_room(&UserId::new("u1"), &other, 99);

        let session = &store.sessions()[0];
        assert_eq!(session.other_user_names, "Renamed");
        assert_eq!(session.other_user_image.as_deref(), Some("u2.png"));
        assert_eq!(session.created_at, 10);
    }

    #[test]
    fn opening_another_room_deactivates_previous() {
        let mut store = SessionStore::new();
        let first = open(&mut store, "u1", "u2");
        let second = open(&mut store, "u1", "u3");

        assert_eq!(active_count(&store), 1);
        assert_eq!(store.active_room_id(), Some(&second.room_id));
        assert!(!store.get(&first.room_id).is_some_and(|s| s.active));
    }

    #[test]
    fn close_only_room_hides_list() {
        let mut store = SessionStore::new();
        let outcome = open(&mut store, "u1", "u2");
        let closed = store.close_room(&outcome.room_id);

        assert!(closed.removed.is_some());
        assert!(closed.promoted.is_none());
        assert!(store.is_empty());
        assert!(!store.show_rooms());
    }

    #[test]
    fn close_active_promotes_first_remaining() {
        let mut store = SessionStore::new();
        let a = open(&mut store, "u1", "u2");
        let b = open(&mut store, "u1", "u3");
        let c = open(&mut store, "u1", "u4");

        let closed = store.close_room(&c.room_id);
        assert_eq!(closed.promoted, Some(a.room_id.clone()));
        assert_eq!(store.active_room_id(), Some(&a.room_id));
        assert!(store.get(&b.room_id).is_some_and(|s| !s.active));
        assert!(store.show_rooms());
    }

    #[test]
    fn close_inactive_keeps_active() {
        let mut store = SessionStore::new();
        let a = open(&mut store, "u1", "u2");
        let b = open(&mut store, "u1", "u3");

        let closed = store.close_room(&a.room_id);
        assert!(closed.promoted.is_none());
        assert_eq!(store.active_room_id(), Some(&b.room_id));
    }

    #[test]
    fn close_unknown_room_is_noop() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");
        let before = store.clone();

        let closed = store.close_room(&RoomId::new("roomnope"));
        assert_eq!(closed, CloseOutcome::default());
        assert_eq!(store.sessions(), before.sessions());
        assert_eq!(store.show_rooms(), before.show_rooms());
    }

    #[test]
    fn set_show_rooms_deactivates_everything() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");

        store.set_show_rooms(false);
        assert!(!store.show_rooms());
        assert_eq!(active_count(&store), 0);

        store.set_show_rooms(true);
        assert!(store.show_rooms());
        assert_eq!(active_count(&store), 0);
    }

    #[test]
    fn set_show_rooms_is_stable_when_repeated() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");
        let _ = open(&mut store, "u1", "u3");

        store.set_show_rooms(true);
        let once = store.clone();
        store.set_show_rooms(true);

        assert_eq!(store.sessions(), once.sessions());
        assert_eq!(store.show_rooms(), once.show_rooms());
    }

    #[test]
    fn close_while_hidden_promotes_without_showing() {
        let mut store = SessionStore::new();
        let a = open(&mut store, "u1", "u2");
        let b = open(&mut store, "u1", "u3");
        store.set_show_rooms(false);

        let closed = store.close_room(&b.room_id);
        assert_eq!(closed.promoted, Some(a.room_id));
        assert!(!store.show_rooms());
    }

    #[test]
    fn clear_drops_sessions() {
        let mut store = SessionStore::new();
        let _ = open(&mut store, "u1", "u2");
        store.clear();

        assert!(store.is_empty());
        assert!(!store.show_rooms());
        assert!(store.active_room_id().is_none());
    }
}
