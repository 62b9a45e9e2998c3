//! Synchronous real-system wrapper for model-based and chaos testing.
//!
//! `SimWorld` wires an [`App`], a [`Bridge`] and a [`SimBackend`] together
//! with the same ordering the runtime uses: every action of a step is
//! executed before the stream batches it caused are delivered, one batch at
//! a time. It mirrors [`ModelWorld`]'s interface so both can be driven by
//! the same [`Operation`] sequence.
//!
//! [`ModelWorld`]: crate::ModelWorld

use std::collections::{BTreeMap, VecDeque};

use huddle_app::{App, AppAction, AppConfig, AppEvent, Bridge, StreamBatch};
use huddle_core::{Environment, Participant, RoomId, UserId, derive_room_id};

use crate::{
    SimBackend, SimEnv,
    invariants::SystemSnapshot,
    model::{
        LOCAL_USER, ObservableState, Operation, OperationError, OperationResult, PEER_COUNT,
        PeerId, peer_user,
    },
};

/// Real App, Bridge and backend for one local user.
#[derive(Debug)]
pub struct SimWorld {
    app: App,
    bridge: Bridge,
    backend: SimBackend,
    env: SimEnv,
    local: Participant,
    /// Room id -> peer, for mapping real state onto model keys.
    peers: BTreeMap<RoomId, PeerId>,
}

impl SimWorld {
    /// Create a signed-out world.
    pub fn new(env: SimEnv, config: AppConfig) -> Self {
        let local = Participant::new(LOCAL_USER, "Me");
        let peers = (0..PEER_COUNT).map(|p| (derive_room_id(&local.id, &peer_user(p)), p)).collect();
        Self { app: App::new(config), bridge: Bridge::new(), backend: SimBackend::new(), env, local, peers }
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::OpenRoom { peer } => {
                let signed_in = self.app.local_user().is_some();
                let other = Participant::new(peer_user(*peer).0, format!("Peer {}", peer % PEER_COUNT));
                let actions = self.app.open_room(other, self.env.now());
                self.dispatch(actions);
                if signed_in {
                    OperationResult::Ok
                } else {
                    OperationResult::Error(OperationError::NotSignedIn)
                }
            },
            Operation::CloseRoom { peer } => {
                let room_id = self.room_id(*peer);
                let open = self.app.sessions().iter().any(|s| s.room_id == room_id);
                let actions = self.app.close_room(&room_id);
                self.dispatch(actions);
                if open { OperationResult::Ok } else { OperationResult::Error(OperationError::RoomNotOpen) }
            },
            Operation::ShowRooms { visible } => {
                let actions = self.app.set_show_rooms(*visible);
                self.dispatch(actions);
                OperationResult::Ok
            },
            Operation::ReceiveMessage { peer, timestamp } => {
                let batches = self.backend.send_message(
                    &peer_user(*peer),
                    &self.local.id,
                    Operation::timestamp_key(*timestamp),
                );
                self.deliver(batches);
                OperationResult::Ok
            },
            Operation::SignIn => {
                let actions = self.app.handle(AppEvent::SignedIn { user: self.local.clone() });
                self.dispatch(actions);
                OperationResult::Ok
            },
            Operation::SignOut => {
                let actions = self.app.handle(AppEvent::SignedOut);
                self.dispatch(actions);
                OperationResult::Ok
            },
            Operation::AdvanceTime { millis } => {
                self.env.advance(u64::from(*millis));
                OperationResult::Ok
            },
        }
    }

    /// Deliver raw batches as if the stream adapter produced them.
    pub fn deliver(&mut self, batches: impl IntoIterator<Item = StreamBatch>) {
        self.run(VecDeque::new(), batches.into_iter().collect());
    }

    /// Execute actions and everything they cause.
    pub fn dispatch(&mut self, actions: Vec<AppAction>) {
        self.run(actions.into(), VecDeque::new());
    }

    fn run(&mut self, mut actions: VecDeque<AppAction>, mut batches: VecDeque<StreamBatch>) {
        loop {
            while let Some(action) = actions.pop_front() {
                self.bridge.process_app_action(&action);
                if action.is_intent() {
                    batches.extend(self.backend.apply(&action));
                }
            }
            let Some(batch) = batches.pop_front() else {
                break;
            };
            for event in self.bridge.process_batch(batch) {
                actions.extend(self.app.handle(event));
            }
        }
    }

    fn room_id(&self, peer: PeerId) -> RoomId {
        derive_room_id(&self.local.id, &peer_user(peer))
    }

    fn peer_of(&self, room_id: &RoomId) -> Option<PeerId> {
        self.peers.get(room_id).copied()
    }

    /// Extract observable state in model terms.
    pub fn observable_state(&self) -> ObservableState {
        let tabs = self
            .app
            .sessions()
            .iter()
            .filter_map(|s| self.peer_of(&s.room_id).map(|p| (p, s.active)))
            .collect();

        let unread = self
            .app
            .unread()
            .counts()
            .iter()
            .filter(|(_, count)| **count > 0)
            .filter_map(|(room_id, count)| self.peer_of(room_id).map(|p| (p, *count)))
            .collect();

        let inbox = self
            .app
            .inbox()
            .messages()
            .map(|map| {
                map.iter()
                    .filter_map(|(room_id, entries)| self.peer_of(room_id).map(|p| (p, entries.len())))
                    .collect()
            })
            .unwrap_or_default();

        ObservableState {
            signed_in: self.app.local_user().is_some(),
            tabs,
            show_rooms: self.app.show_rooms(),
            unread,
            inbox,
        }
    }

    /// Snapshot for invariant checking.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_apps([&self.app])
    }

    /// The local user's id.
    pub fn local_user(&self) -> &UserId {
        &self.local.id
    }

    /// The App under test.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The Bridge under test.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// The backend store.
    pub fn backend(&self) -> &SimBackend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in_world() -> SimWorld {
        let mut world = SimWorld::new(SimEnv::default(), AppConfig::default());
        assert_eq!(world.apply(&Operation::SignIn), OperationResult::Ok);
        world
    }

    #[test]
    fn open_persists_and_subscribes() {
        let mut world = signed_in_world();
        let _ = world.apply(&Operation::OpenRoom { peer: 1 });

        let room_id = RoomId::new("roommep1");
        assert!(world.backend().rooms().contains_key(&room_id));
        assert!(world.backend().is_subscribed(&room_id));
        assert_eq!(world.observable_state().tabs, vec![(1, true)]);
    }

    #[test]
    fn opening_room_deletes_stored_inbox() {
        let mut world = signed_in_world();
        let _ = world.apply(&Operation::ReceiveMessage { peer: 2, timestamp: 1 });
        assert_eq!(world.observable_state().inbox.get(&2), Some(&1));

        let _ = world.apply(&Operation::OpenRoom { peer: 2 });
        assert!(world.observable_state().inbox.is_empty());
        assert!(world.backend().inbox_docs(world.local_user()).is_empty());
    }

    #[test]
    fn close_unknown_room_is_rejected() {
        let mut world = signed_in_world();
        assert_eq!(
            world.apply(&Operation::CloseRoom { peer: 3 }),
            OperationResult::Error(OperationError::RoomNotOpen)
        );
    }
}
