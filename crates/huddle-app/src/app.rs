//! Application state machine.
//!
//! This module defines the [`App`] state machine, which owns the chat view
//! state completely decoupled from I/O and the backing store.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! user intents and produces [`crate::AppAction`] instructions for the
//! runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the [`SessionStore`], [`Inbox`] and [`UnreadCounts`]; nothing else
//!   mutates them.
//! - Runs the activation hook whenever a room comes on screen: its unread
//!   count is cleared and its inbox entries are deleted.
//! - Hands out message-stream subscriptions, one live generation per open
//!   room.

use std::collections::BTreeMap;

use huddle_core::{
    Inbox, Participant, RoomId, RoomSession, SessionStore, Timestamp, UnreadCounts, UserId,
};

use crate::{AppAction, AppConfig, AppError, AppEvent, AuthState, RoomRecord, SubscriptionId};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Runtime configuration.
    config: AppConfig,
    /// Auth state.
    auth: AuthState,
    /// Open room tabs and the active room.
    sessions: SessionStore,
    /// Unread inbox notifications.
    inbox: Inbox,
    /// Messages missed per inactive room.
    unread: UnreadCounts,
    /// Live message subscription per open room.
    subscriptions: BTreeMap<RoomId, SubscriptionId>,
    /// Generation handed to the next subscription.
    next_generation: u64,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a signed-out App.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            auth: AuthState::SignedOut,
            sessions: SessionStore::new(),
            inbox: Inbox::new(),
            unread: UnreadCounts::new(),
            subscriptions: BTreeMap::new(),
            next_generation: 1,
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::SignedIn { user } => {
                let mut actions = Vec::new();
                if let AuthState::SignedIn { user: current } = &self.auth {
                    if current.id == user.id {
                        self.auth = AuthState::SignedIn { user };
                        return vec![AppAction::Render];
                    }
                    actions.extend(self.teardown());
                }

                tracing::info!(user_id = %user.id, "signed in");
                self.status_message = Some(format!("Signed in as {}", user.names));
                actions.push(AppAction::SubscribeInbox { user_id: user.id.clone() });
                actions.push(AppAction::Render);
                self.auth = AuthState::SignedIn { user };
                actions
            },
            AppEvent::SignedOut => {
                let mut actions = self.teardown();
                self.status_message = None;
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::InboxSnapshot { records } => {
                if self.auth == AuthState::SignedOut {
                    tracing::debug!("inbox snapshot after sign-out dropped");
                    return vec![];
                }

                let _ = self.inbox.set_inbox(Some(records));
                let mut actions = Vec::new();

                // The active room is on screen, so anything pushed for it is
                // already read.
                if let Some(active) = self.sessions.active_room_id().cloned() {
                    self.delete_inbox(&active, &mut actions);
                }
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::MessagesDelivered { room_id, old_count, new_count } => {
                let _ = self.unread.record_delivery(
                    &room_id,
                    self.sessions.active_room_id(),
                    old_count,
                    new_count,
                );
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Open the room with `other` and put it on screen.
    ///
    /// Rejected intents (not signed in, disallowed self-chat) only set the
    /// status message.
    pub fn open_room(&mut self, other: Participant, now: Timestamp) -> Vec<AppAction> {
        match self.try_open_room(other, now) {
            Ok(actions) => actions,
            Err(e) => {
                tracing::debug!(error = %e, "open room rejected");
                self.status_message = Some(e.to_string());
                vec![AppAction::Render]
            },
        }
    }

    fn try_open_room(
        &mut self,
        other: Participant,
        now: Timestamp,
    ) -> Result<Vec<AppAction>, AppError> {
        let AuthState::SignedIn { user } = &self.auth else {
            return Err(AppError::NotSignedIn);
        };
        let local = user.id.clone();
        if local == other.id && !self.config.allow_self_chat {
            return Err(AppError::SelfChat { user_id: local });
        }

        let outcome = self.sessions.open_room(&local, &other, now);
        let room_id = outcome.room_id;
        let mut actions = Vec::new();

        if outcome.created {
            actions.push(AppAction::PersistRoom {
                record: RoomRecord {
                    room_id: room_id.clone(),
                    creator_id: local.clone(),
                    participants: [local, other.id],
                    created_at: now,
                },
            });
        }
        if !self.subscriptions.contains_key(&room_id) {
            let subscription = self.next_subscription(room_id.clone());
            actions.push(AppAction::Subscribe { subscription });
        }

        self.settle_active(&room_id, &mut actions);
        actions.push(AppAction::Render);
        Ok(actions)
    }

    /// Close a room tab. Unknown rooms produce no actions.
    pub fn close_room(&mut self, room_id: &RoomId) -> Vec<AppAction> {
        let outcome = self.sessions.close_room(room_id);
        if outcome.removed.is_none() {
            return vec![];
        }

        let mut actions = Vec::new();
        self.unread.clear(room_id);
        if let Some(subscription) = self.subscriptions.remove(room_id) {
            actions.push(AppAction::Unsubscribe { subscription });
        }
        if let Some(promoted) = outcome.promoted {
            self.settle_active(&promoted, &mut actions);
        }
        actions.push(AppAction::Render);
        actions
    }

    /// Show or hide the room list.
    pub fn set_show_rooms(&mut self, visible: bool) -> Vec<AppAction> {
        self.sessions.set_show_rooms(visible);
        vec![AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Activation hook: a room that comes on screen has nothing unread.
    fn settle_active(&mut self, room_id: &RoomId, actions: &mut Vec<AppAction>) {
        self.unread.clear(room_id);
        self.delete_inbox(room_id, actions);
    }

    fn delete_inbox(&mut self, room_id: &RoomId, actions: &mut Vec<AppAction>) {
        if let Some(entries) = self.inbox.delete_inbox_messages(room_id) {
            actions.push(AppAction::DeleteInbox {
                room_id: room_id.clone(),
                timestamp_keys: entries.into_keys().collect(),
            });
        }
    }

    fn next_subscription(&mut self, room_id: RoomId) -> SubscriptionId {
        let subscription = SubscriptionId { room_id: room_id.clone(), generation: self.next_generation };
        self.next_generation += 1;
        self.subscriptions.insert(room_id, subscription.clone());
        subscription
    }

    /// Drop all per-user state and return the teardown intents.
    fn teardown(&mut self) -> Vec<AppAction> {
        let mut actions: Vec<AppAction> = std::mem::take(&mut self.subscriptions)
            .into_values()
            .map(|subscription| AppAction::Unsubscribe { subscription })
            .collect();
        if let AuthState::SignedIn { user } = &self.auth {
            tracing::info!(user_id = %user.id, "signed out");
            actions.push(AppAction::UnsubscribeInbox);
        }

        self.sessions.clear();
        let _ = self.inbox.set_inbox(None);
        self.unread.reset();
        self.auth = AuthState::SignedOut;
        actions
    }

    /// Current auth state.
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    /// Signed-in participant. `None` if signed out.
    pub fn local_user(&self) -> Option<&Participant> {
        match &self.auth {
            AuthState::SignedIn { user } => Some(user),
            AuthState::SignedOut => None,
        }
    }

    /// Signed-in user id. `None` if signed out.
    pub fn local_user_id(&self) -> Option<&UserId> {
        self.local_user().map(|user| &user.id)
    }

    /// Open sessions in tab order.
    pub fn sessions(&self) -> &[RoomSession] {
        self.sessions.sessions()
    }

    /// Room list visibility.
    pub fn show_rooms(&self) -> bool {
        self.sessions.show_rooms()
    }

    /// Currently displayed room. `None` if no room is active.
    pub fn active_room(&self) -> Option<&RoomId> {
        self.sessions.active_room_id()
    }

    /// Session of the displayed room. `None` if no room is active.
    pub fn active_session(&self) -> Option<&RoomSession> {
        self.active_room().and_then(|id| self.sessions.get(id))
    }

    /// Unread inbox notifications.
    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Unread counts per room.
    pub fn unread(&self) -> &UnreadCounts {
        &self.unread
    }

    /// Live subscription of `room_id`. `None` if the room is not open.
    pub fn subscription(&self, room_id: &RoomId) -> Option<&SubscriptionId> {
        self.subscriptions.get(room_id)
    }

    /// Live subscriptions keyed by room.
    pub fn subscriptions(&self) -> &BTreeMap<RoomId, SubscriptionId> {
        &self.subscriptions
    }

    /// Configuration the app was built with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
