//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::{BTreeSet, HashMap};

use huddle_core::{RoomId, UserId};

use super::{Invariant, InvariantResult, SystemSnapshot};

fn who(user_id: Option<&UserId>) -> &str {
    user_id.map_or("<signed out>", UserId::as_str)
}

/// At most one room is displayed at a time.
pub struct SingleActiveRoom;

impl Invariant for SingleActiveRoom {
    fn name(&self) -> &'static str {
        "single_active_room"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let active: Vec<_> = client.active_rooms().collect();
            if active.len() > 1 {
                return Err(self.violation(format!(
                    "client {}: {} active rooms {active:?}",
                    who(client.user_id.as_ref()),
                    active.len()
                )));
            }
        }
        Ok(())
    }
}

/// No two sessions share a room id.
pub struct UniqueSessions;

impl Invariant for UniqueSessions {
    fn name(&self) -> &'static str {
        "unique_sessions"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = BTreeSet::new();
            for session in &client.sessions {
                if !seen.insert(&session.room_id) {
                    return Err(self.violation(format!(
                        "client {}: duplicate session {}",
                        who(client.user_id.as_ref()),
                        session.room_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The displayed room has no unread count and no inbox entries.
///
/// Anything delivered for the room on screen has already been seen.
pub struct ActiveRoomSettled;

impl Invariant for ActiveRoomSettled {
    fn name(&self) -> &'static str {
        "active_room_settled"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            for room_id in client.active_rooms() {
                if let Some(count) = client.unread.get(room_id) {
                    return Err(self.violation(format!(
                        "client {}: active room {room_id} has {count} unread",
                        who(client.user_id.as_ref())
                    )));
                }
                if let Some(entries) = client.inbox.get(room_id) {
                    return Err(self.violation(format!(
                        "client {}: active room {room_id} has {entries} inbox entries",
                        who(client.user_id.as_ref())
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The inbox never keeps a room with zero entries.
pub struct NoEmptyInboxRoom;

impl Invariant for NoEmptyInboxRoom {
    fn name(&self) -> &'static str {
        "no_empty_inbox_room"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some((room_id, _)) = client.inbox.iter().find(|(_, entries)| **entries == 0) {
                return Err(self.violation(format!(
                    "client {}: empty inbox room {room_id}",
                    who(client.user_id.as_ref())
                )));
            }
        }
        Ok(())
    }
}

/// Every open room has exactly one live subscription and closed rooms have
/// none.
pub struct SubscriptionsMatchSessions;

impl Invariant for SubscriptionsMatchSessions {
    fn name(&self) -> &'static str {
        "subscriptions_match_sessions"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let open: BTreeSet<&RoomId> = client.sessions.iter().map(|s| &s.room_id).collect();
            let subscribed: BTreeSet<&RoomId> = client.subscriptions.iter().collect();
            if open != subscribed {
                return Err(self.violation(format!(
                    "client {}: sessions {open:?} but subscriptions {subscribed:?}",
                    who(client.user_id.as_ref())
                )));
            }
        }
        Ok(())
    }
}

/// A signed-out client holds no per-user state.
pub struct SignedOutIsEmpty;

impl Invariant for SignedOutIsEmpty {
    fn name(&self) -> &'static str {
        "signed_out_is_empty"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for (index, client) in state.clients.iter().enumerate() {
            if client.user_id.is_some() {
                continue;
            }
            let leftover = !client.sessions.is_empty()
                || !client.subscriptions.is_empty()
                || !client.unread.is_empty()
                || !client.inbox.is_empty();
            if leftover {
                return Err(self.violation(format!("signed-out client #{index} kept state")));
            }
        }
        Ok(())
    }
}

/// Both parties of a conversation derive the same room id.
///
/// For every session of user A with user B, and every session of B with A,
/// the room ids must be equal.
pub struct RoomIdAgreement;

impl Invariant for RoomIdAgreement {
    fn name(&self) -> &'static str {
        "room_id_agreement"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        // (local, other) -> room id
        let mut pairs: HashMap<(&UserId, &UserId), &RoomId> = HashMap::new();
        for client in &state.clients {
            let Some(local) = client.user_id.as_ref() else {
                continue;
            };
            for session in &client.sessions {
                let _ = pairs.insert((local, &session.other_user_id), &session.room_id);
            }
        }

        for ((local, other), room_id) in &pairs {
            if let Some(mirror) = pairs.get(&(*other, *local))
                && mirror != room_id
            {
                return Err(self.violation(format!(
                    "{local} sees {room_id} with {other}, {other} sees {mirror}"
                )));
            }
        }
        Ok(())
    }
}
