//! Final view state written after a replay.

use std::collections::BTreeMap;

use huddle_app::{App, AppAction};
use huddle_core::{InboxMap, Participant, RoomId, RoomSession};
use serde::Serialize;

/// Everything a UI would read from the app, plus the intents it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Signed-in participant. `None` if signed out.
    pub user: Option<Participant>,
    /// Open rooms in tab order.
    pub sessions: Vec<RoomSession>,
    /// Room list visibility.
    pub show_rooms: bool,
    /// Displayed room.
    pub active_room: Option<RoomId>,
    /// Unread inbox entries. `None` if nothing is unread.
    pub inbox: Option<InboxMap>,
    /// Non-zero unread counts.
    pub unread: BTreeMap<RoomId, u64>,
    /// Last status message.
    pub status: Option<String>,
    /// Intents accepted by the persistence layer, in order.
    pub executed: Vec<AppAction>,
    /// Number of intents that failed.
    pub failed: usize,
}

impl ViewState {
    /// Capture the view of `app` alongside the replay's intent log.
    pub fn capture(app: &App, executed: Vec<AppAction>, failed: usize) -> Self {
        Self {
            user: app.local_user().cloned(),
            sessions: app.sessions().to_vec(),
            show_rooms: app.show_rooms(),
            active_room: app.active_room().cloned(),
            inbox: app.inbox().messages().cloned(),
            unread: app
                .unread()
                .counts()
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(room_id, count)| (room_id.clone(), *count))
                .collect(),
            status: app.status_message().map(str::to_owned),
            executed,
            failed,
        }
    }
}
