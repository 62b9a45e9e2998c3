//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the replay driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`huddle_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Intents are applied to an in-memory [`SimBackend`] whose change batches
//! flow back through a real stream channel. Batches already queued are
//! drained before the next scripted input, so a run is fully deterministic.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use huddle_app::{
    App, AppAction, AppEvent, Driver, DEFAULT_CHANNEL_CAPACITY, StreamBatch, StreamReceiver,
    StreamSender, stream_channel,
};
use huddle_core::{Environment, Participant, RoomId, Timestamp, UserId};

use crate::{
    SimBackend, SimEnv,
    invariants::{InvariantRegistry, SystemSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted input.
#[derive(Debug, Clone)]
pub enum SimInput {
    /// Feed an event straight to the app.
    Event(AppEvent),
    /// User opens the room with a participant.
    OpenRoom(Participant),
    /// User closes a room tab.
    CloseRoom(RoomId),
    /// User shows or hides the room list.
    ShowRooms(bool),
    /// Someone sends a message through the backend.
    Message {
        /// Sender.
        from: UserId,
        /// Recipient.
        to: UserId,
        /// Receive timestamp of the inbox document.
        timestamp: String,
    },
    /// Push a raw batch onto the stream, bypassing the backend.
    Batch(StreamBatch),
    /// Advance the virtual clock.
    Advance(u64),
    /// Quit the runtime.
    Quit,
}

/// Shared state for input injection and inspection.
#[derive(Debug, Default)]
struct SharedState {
    pending: VecDeque<SimInput>,
    backend: SimBackend,
    executed: Vec<AppAction>,
    failed: Vec<AppAction>,
    renders: usize,
    fail_persistence: bool,
    stopped: bool,
}

fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle onto a [`SimDriver`]'s shared state.
///
/// Stays usable after the driver has been moved into a runtime.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SharedState>>,
}

impl SimHandle {
    /// Queue a scripted input.
    pub fn inject(&self, input: SimInput) {
        lock(&self.state).pending.push_back(input);
    }

    /// Queue an app event.
    pub fn inject_event(&self, event: AppEvent) {
        self.inject(SimInput::Event(event));
    }

    /// Queue a sign-in.
    pub fn sign_in(&self, user: Participant) {
        self.inject_event(AppEvent::SignedIn { user });
    }

    /// Queue opening the room with `other`.
    pub fn open_room(&self, other: Participant) {
        self.inject(SimInput::OpenRoom(other));
    }

    /// Queue a message from `from` to `to`.
    pub fn send_message(&self, from: &str, to: &str, timestamp: &str) {
        self.inject(SimInput::Message {
            from: from.into(),
            to: to.into(),
            timestamp: timestamp.to_owned(),
        });
    }

    /// Make every persistence intent fail until turned off.
    pub fn fail_persistence(&self, fail: bool) {
        lock(&self.state).fail_persistence = fail;
    }

    /// Check if there are inputs left to process.
    pub fn has_pending(&self) -> bool {
        !lock(&self.state).pending.is_empty()
    }

    /// Intents the backend accepted, in order.
    pub fn executed(&self) -> Vec<AppAction> {
        lock(&self.state).executed.clone()
    }

    /// Intents rejected by failure injection, in order.
    pub fn failed(&self) -> Vec<AppAction> {
        lock(&self.state).failed.clone()
    }

    /// Number of renders.
    pub fn render_count(&self) -> usize {
        lock(&self.state).renders
    }

    /// Copy of the backend store.
    pub fn backend(&self) -> SimBackend {
        lock(&self.state).backend.clone()
    }

    /// Check if the driver was stopped.
    pub fn is_stopped(&self) -> bool {
        lock(&self.state).stopped
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`huddle_app::Runtime`] orchestration
/// code runs in both the replay CLI and simulation tests. The runtime quits
/// once every input is consumed and the stream is drained.
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    env: SimEnv,
    tx: StreamSender,
    rx: StreamReceiver,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver advancing `env` on [`SimInput::Advance`].
    pub fn new(env: SimEnv) -> Self {
        let (tx, rx) = stream_channel(DEFAULT_CHANNEL_CAPACITY);
        Self { state: Arc::new(Mutex::new(SharedState::default())), env, tx, rx, invariants: None }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Handle for injection and inspection.
    pub fn handle(&self) -> SimHandle {
        SimHandle { state: Arc::clone(&self.state) }
    }

    /// Check invariants against App state.
    pub fn check_invariants(&self, app: &App, context: &str) {
        if let Some(registry) = &self.invariants {
            registry.assert_all(&SystemSnapshot::from_apps([app]), context);
        }
    }

    fn enqueue(&self, batches: Vec<StreamBatch>) -> Result<(), SimDriverError> {
        for batch in batches {
            self.tx.try_send(batch).map_err(|e| SimDriverError(e.to_string()))?;
        }
        Ok(())
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(
        &mut self,
        app: &mut App,
        now: Timestamp,
    ) -> Result<Vec<AppAction>, Self::Error> {
        // Queued batches go first
        if !self.rx.is_empty() {
            return Ok(vec![]);
        }

        let next = lock(&self.state).pending.pop_front();
        let Some(input) = next else {
            return Ok(app.quit());
        };

        match input {
            SimInput::Event(event) => Ok(app.handle(event)),
            SimInput::OpenRoom(other) => Ok(app.open_room(other, now)),
            SimInput::CloseRoom(room_id) => Ok(app.close_room(&room_id)),
            SimInput::ShowRooms(visible) => Ok(app.set_show_rooms(visible)),
            SimInput::Message { from, to, timestamp } => {
                let batches = lock(&self.state).backend.send_message(&from, &to, timestamp);
                self.enqueue(batches)?;
                Ok(vec![])
            },
            SimInput::Batch(batch) => {
                self.enqueue(vec![batch])?;
                Ok(vec![])
            },
            SimInput::Advance(millis) => {
                self.env.advance(millis);
                tracing::trace!(now = self.env.now(), "clock advanced");
                Ok(vec![])
            },
            SimInput::Quit => Ok(app.quit()),
        }
    }

    async fn recv_batch(&mut self) -> Option<StreamBatch> {
        self.rx.try_recv()
    }

    async fn execute(&mut self, action: &AppAction) -> Result<(), Self::Error> {
        let batches = {
            let mut state = lock(&self.state);
            let persistence =
                matches!(action, AppAction::PersistRoom { .. } | AppAction::DeleteInbox { .. });
            if persistence && state.fail_persistence {
                state.failed.push(action.clone());
                return Err(SimDriverError("persistence unavailable".into()));
            }
            state.executed.push(action.clone());
            state.backend.apply(action)
        };
        self.enqueue(batches)
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let renders = {
            let mut state = lock(&self.state);
            state.renders += 1;
            state.renders
        };
        self.check_invariants(app, &format!("at render #{renders}"));
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.state).stopped = true;
    }
}
