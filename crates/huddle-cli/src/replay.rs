//! Script-driven [`Driver`].
//!
//! User and auth steps are applied to the app directly. Stream steps are
//! pushed through the same channel a live stream adapter would use, so the
//! runtime sees them in script order and the bridge filters them exactly as
//! it would in production.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_app::{
    App, AppAction, AppConfig, AppEvent, Driver, Runtime, StreamBatch, StreamReceiver, StreamSender,
    SubscriptionId, stream_channel,
};
use huddle_core::{Participant, Timestamp, UserId, derive_room_id};

use crate::{ReplayClock, ReplayError, ScriptStep, ViewState};

/// Settings for one replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// App configuration.
    pub config: AppConfig,
    /// Reject every persistence intent.
    pub fail_persistence: bool,
    /// Clock start in milliseconds since the Unix epoch. Wall clock if unset.
    pub start_ms: Option<Timestamp>,
}

/// Intents seen by the driver.
#[derive(Debug, Default)]
struct ReplayLog {
    executed: Vec<AppAction>,
    failed: usize,
}

/// Driver that feeds a parsed script to the runtime.
pub struct ReplayDriver {
    steps: VecDeque<ScriptStep>,
    tx: StreamSender,
    rx: StreamReceiver,
    clock: ReplayClock,
    fail_persistence: bool,
    log: Arc<Mutex<ReplayLog>>,
}

impl ReplayDriver {
    /// Create a driver for `steps`.
    ///
    /// `clock` should be shared with the runtime so `advance_clock` steps move
    /// the time it reads.
    pub fn new(steps: Vec<ScriptStep>, clock: ReplayClock, options: &ReplayOptions) -> Self {
        let (tx, rx) = stream_channel(options.config.channel_capacity);
        Self {
            steps: steps.into(),
            tx,
            rx,
            clock,
            fail_persistence: options.fail_persistence,
            log: Arc::new(Mutex::new(ReplayLog::default())),
        }
    }

    /// Steps not yet applied.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    fn log(&self) -> MutexGuard<'_, ReplayLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&mut self, app: &mut App, step: ScriptStep, now: Timestamp) -> Result<Vec<AppAction>, ReplayError> {
        match step {
            ScriptStep::SignIn { id, names, image } => {
                Ok(app.handle(AppEvent::SignedIn { user: participant(id, names, image) }))
            },
            ScriptStep::SignOut => Ok(app.handle(AppEvent::SignedOut)),
            ScriptStep::OpenRoom { id, names, image } => Ok(app.open_room(participant(id, names, image), now)),
            ScriptStep::CloseRoom { with } => {
                let Some(local) = app.local_user_id() else {
                    tracing::debug!(%with, "close_room while signed out, skipping");
                    return Ok(Vec::new());
                };
                let room_id = derive_room_id(local, &UserId::new(with));
                Ok(app.close_room(&room_id))
            },
            ScriptStep::ShowRooms { visible } => Ok(app.set_show_rooms(visible)),
            ScriptStep::Inbox { changes } => {
                self.tx.try_send(StreamBatch::Inbox { changes })?;
                Ok(Vec::new())
            },
            ScriptStep::Messages { with, count, generation } => {
                let Some(local) = app.local_user_id() else {
                    tracing::debug!(%with, "messages while signed out, skipping");
                    return Ok(Vec::new());
                };
                let room_id = derive_room_id(local, &UserId::new(with));
                let subscription = match generation {
                    Some(generation) => Some(SubscriptionId { room_id, generation }),
                    None => app.subscription(&room_id).cloned(),
                };
                match subscription {
                    Some(subscription) => {
                        self.tx.try_send(StreamBatch::Messages { subscription, message_count: count })?;
                    },
                    None => tracing::warn!(%count, "messages for a room without a subscription, skipping"),
                }
                Ok(Vec::new())
            },
            ScriptStep::AdvanceClock { millis } => {
                self.clock.advance(millis);
                Ok(Vec::new())
            },
        }
    }
}

impl Driver for ReplayDriver {
    type Error = ReplayError;

    async fn poll_event(&mut self, app: &mut App, now: Timestamp) -> Result<Vec<AppAction>, Self::Error> {
        // Queued batches go first so each step sees the effects of the last
        if !self.rx.is_empty() {
            return Ok(Vec::new());
        }

        match self.steps.pop_front() {
            Some(step) => {
                tracing::trace!(?step, "applying step");
                self.apply(app, step, now)
            },
            None => Ok(app.quit()),
        }
    }

    async fn recv_batch(&mut self) -> Option<StreamBatch> {
        self.rx.try_recv()
    }

    async fn execute(&mut self, action: &AppAction) -> Result<(), Self::Error> {
        let persistence = matches!(action, AppAction::PersistRoom { .. } | AppAction::DeleteInbox { .. });
        let mut log = self.log();
        if self.fail_persistence && persistence {
            log.failed += 1;
            return Err(ReplayError::PersistenceUnavailable);
        }
        log.executed.push(action.clone());
        Ok(())
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        tracing::debug!(
            sessions = app.sessions().len(),
            active = ?app.active_room(),
            show_rooms = app.show_rooms(),
            unread = app.unread().total(),
            "render"
        );
        Ok(())
    }

    fn stop(&mut self) {
        tracing::info!(remaining = self.steps.len(), queued = self.rx.len(), "replay finished");
    }
}

/// Run `steps` to completion and capture the final view.
///
/// # Errors
///
/// Returns an error if a stream batch cannot be queued. Rejected intents are
/// not errors; they are counted in [`ViewState::failed`].
pub async fn replay(steps: Vec<ScriptStep>, options: &ReplayOptions) -> Result<ViewState, ReplayError> {
    let clock = options.start_ms.map_or_else(ReplayClock::system, ReplayClock::starting_at);
    let driver = ReplayDriver::new(steps, clock.clone(), options);
    let log = Arc::clone(&driver.log);

    let app = Runtime::new(driver, clock, options.config.clone()).run().await?;

    let log = std::mem::take(&mut *log.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(ViewState::capture(&app, log.executed, log.failed))
}

fn participant(id: String, names: String, image: Option<String>) -> Participant {
    let participant = Participant::new(id, names);
    match image {
        Some(image) => participant.with_image(image),
        None => participant,
    }
}

#[cfg(test)]
mod tests {
    use huddle_app::DocChange;
    use huddle_core::{InboxRecord, RoomId};

    use super::*;
    use crate::parse_script;

    fn options() -> ReplayOptions {
        ReplayOptions { start_ms: Some(1_000), ..ReplayOptions::default() }
    }

    #[tokio::test]
    async fn open_room_persists_and_subscribes() {
        let steps = parse_script(
            r#"{"step": "sign_in", "id": "u1", "names": "Una"}
               {"step": "open_room", "id": "u2", "names": "Ugo"}"#,
        )
        .unwrap();

        let view = replay(steps, &options()).await.unwrap();

        assert_eq!(view.active_room, Some(RoomId::new("roomu1u2")));
        assert!(view.executed.iter().any(|a| matches!(a, AppAction::PersistRoom { record } if record.created_at == 1_000)));
        assert!(view.executed.iter().any(|a| matches!(a, AppAction::Subscribe { .. })));
        assert_eq!(view.failed, 0);
    }

    #[tokio::test]
    async fn background_messages_count_after_baseline() {
        let steps = parse_script(
            r#"{"step": "sign_in", "id": "u1"}
               {"step": "open_room", "id": "u2"}
               {"step": "open_room", "id": "u3"}
               {"step": "messages", "with": "u2", "count": 5}
               {"step": "messages", "with": "u2", "count": 8}"#,
        )
        .unwrap();

        let view = replay(steps, &options()).await.unwrap();

        assert_eq!(view.unread.get(&RoomId::new("roomu1u2")), Some(&3));
    }

    #[tokio::test]
    async fn stale_generation_is_ignored() {
        let steps = parse_script(
            r#"{"step": "sign_in", "id": "u1"}
               {"step": "open_room", "id": "u2"}
               {"step": "open_room", "id": "u3"}
               {"step": "messages", "with": "u2", "count": 1}
               {"step": "messages", "with": "u2", "count": 9, "generation": 0}"#,
        )
        .unwrap();

        let view = replay(steps, &options()).await.unwrap();

        assert!(view.unread.is_empty());
    }

    #[tokio::test]
    async fn failing_persistence_keeps_local_state() {
        let steps = parse_script(
            r#"{"step": "sign_in", "id": "u1"}
               {"step": "open_room", "id": "u2"}"#,
        )
        .unwrap();
        let options = ReplayOptions { fail_persistence: true, ..options() };

        let view = replay(steps, &options).await.unwrap();

        assert_eq!(view.sessions.len(), 1);
        assert_eq!(view.failed, 1);
        assert!(view.status.is_some_and(|s| s.starts_with("Error:")));
    }

    #[tokio::test]
    async fn close_while_signed_out_is_a_no_op() {
        let steps = vec![ScriptStep::CloseRoom { with: "u2".into() }];

        let view = replay(steps, &options()).await.unwrap();

        assert!(view.sessions.is_empty());
        assert!(view.executed.is_empty());
    }

    #[tokio::test]
    async fn clock_advances_between_steps() {
        let steps = vec![
            ScriptStep::SignIn { id: "u1".into(), names: String::new(), image: None },
            ScriptStep::AdvanceClock { millis: 250 },
            ScriptStep::OpenRoom { id: "u2".into(), names: String::new(), image: None },
        ];

        let view = replay(steps, &options()).await.unwrap();

        assert!(view.executed.iter().any(|a| matches!(a, AppAction::PersistRoom { record } if record.created_at == 1_250)));
    }

    #[tokio::test]
    async fn inbox_for_background_room_is_kept() {
        let record = InboxRecord::new("d1", "roomu1u3", "t1", "u3");
        let steps = vec![
            ScriptStep::SignIn { id: "u1".into(), names: String::new(), image: None },
            ScriptStep::Inbox { changes: vec![DocChange::added(record)] },
        ];

        let view = replay(steps, &options()).await.unwrap();

        let inbox = view.inbox.unwrap();
        assert_eq!(inbox[&RoomId::new("roomu1u3")].len(), 1);
    }
}
