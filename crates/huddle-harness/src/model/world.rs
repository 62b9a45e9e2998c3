//! Model world - the reference implementation of the chat view.
//!
//! The world keeps the simplest possible bookkeeping for one local user: a
//! list of tabs, per-peer unread counters and the set of inbox timestamps the
//! store still holds. It's the oracle against which the real App, Bridge and
//! backend are verified.

use std::collections::{BTreeMap, BTreeSet};

use super::operation::{Operation, OperationError, OperationResult, PEER_COUNT, PeerId};

/// Observable state for oracle comparison.
///
/// Peers are identified by their reduced id so both sides render the same
/// keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObservableState {
    /// Local user is signed in.
    pub signed_in: bool,
    /// Tabs in order as (peer, active).
    pub tabs: Vec<(PeerId, bool)>,
    /// Room list visibility.
    pub show_rooms: bool,
    /// Non-zero unread counts per peer.
    pub unread: BTreeMap<PeerId, u64>,
    /// Distinct inbox timestamps per peer, as seen by the client.
    pub inbox: BTreeMap<PeerId, usize>,
}

/// Reference model of one local user.
#[derive(Debug, Clone, Default)]
pub struct ModelWorld {
    signed_in: bool,
    tabs: Vec<(PeerId, bool)>,
    show_rooms: bool,
    unread: BTreeMap<PeerId, u64>,
    /// Inbox timestamps held by the store, whether or not anyone listens.
    stored_inbox: BTreeMap<PeerId, BTreeSet<String>>,
}

impl ModelWorld {
    /// Create a signed-out world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::OpenRoom { peer } => self.apply_open(*peer % PEER_COUNT),
            Operation::CloseRoom { peer } => self.apply_close(*peer % PEER_COUNT),
            Operation::ShowRooms { visible } => {
                self.show_rooms = *visible;
                for tab in &mut self.tabs {
                    tab.1 = false;
                }
                OperationResult::Ok
            },
            Operation::ReceiveMessage { peer, timestamp } => {
                self.apply_receive(*peer % PEER_COUNT, Operation::timestamp_key(*timestamp));
                OperationResult::Ok
            },
            Operation::SignIn => {
                self.signed_in = true;
                OperationResult::Ok
            },
            Operation::SignOut => {
                self.signed_in = false;
                self.tabs.clear();
                self.show_rooms = false;
                self.unread.clear();
                OperationResult::Ok
            },
            // Model doesn't track time
            Operation::AdvanceTime { .. } => OperationResult::Ok,
        }
    }

    fn apply_open(&mut self, peer: PeerId) -> OperationResult {
        if !self.signed_in {
            return OperationResult::Error(OperationError::NotSignedIn);
        }
        if !self.tabs.iter().any(|(p, _)| *p == peer) {
            self.tabs.push((peer, false));
        }
        self.activate(peer);
        self.show_rooms = true;
        OperationResult::Ok
    }

    fn apply_close(&mut self, peer: PeerId) -> OperationResult {
        let Some(index) = self.tabs.iter().position(|(p, _)| *p == peer) else {
            return OperationResult::Error(OperationError::RoomNotOpen);
        };
        let _ = self.tabs.remove(index);
        let _ = self.unread.remove(&peer);

        if !self.tabs.iter().any(|(_, active)| *active)
            && let Some(&(next, _)) = self.tabs.first()
        {
            self.activate(next);
        }
        if self.tabs.is_empty() {
            self.show_rooms = false;
        }
        OperationResult::Ok
    }

    fn apply_receive(&mut self, peer: PeerId, timestamp: String) {
        let active = self.active_peer();
        if active == Some(peer) {
            // Seen as it arrives
            return;
        }
        if self.tabs.iter().any(|(p, _)| *p == peer) {
            *self.unread.entry(peer).or_insert(0) += 1;
        }
        let _ = self.stored_inbox.entry(peer).or_default().insert(timestamp);
    }

    /// Put `peer` on screen and settle it.
    fn activate(&mut self, peer: PeerId) {
        for tab in &mut self.tabs {
            tab.1 = tab.0 == peer;
        }
        let _ = self.unread.remove(&peer);
        let _ = self.stored_inbox.remove(&peer);
    }

    fn active_peer(&self) -> Option<PeerId> {
        self.tabs.iter().find(|(_, active)| *active).map(|(p, _)| *p)
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let inbox = if self.signed_in {
            self.stored_inbox
                .iter()
                .filter(|(_, stamps)| !stamps.is_empty())
                .map(|(peer, stamps)| (*peer, stamps.len()))
                .collect()
        } else {
            BTreeMap::new()
        };

        ObservableState {
            signed_in: self.signed_in,
            tabs: self.tabs.clone(),
            show_rooms: self.show_rooms,
            unread: self.unread.iter().filter(|(_, n)| **n > 0).map(|(p, n)| (*p, *n)).collect(),
            inbox,
        }
    }
}
