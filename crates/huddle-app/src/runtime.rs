//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: view state machine
//! - [`Bridge`]: stream adapter boundary
//! - [`Driver`]: Platform-specific I/O
//!
//! Each public operation of the app runs to completion before the next event
//! or batch is looked at, so stream batches and user input never interleave
//! within one mutation.

use huddle_core::Environment;

use crate::{App, AppAction, AppConfig, AppEvent, Bridge, Driver, StreamBatch};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing the clock
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    app: App,
    bridge: Bridge,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a new runtime with the given driver, environment and config.
    pub fn new(driver: D, env: E, config: AppConfig) -> Self {
        Self { driver, env, app: App::new(config), bridge: Bridge::new() }
    }

    /// Run the main event loop until the app quits.
    ///
    /// Each cycle:
    /// 1. Polls the driver for user input and applies it to the App
    /// 2. Receives at most one stream batch and routes it through the Bridge
    /// 3. Executes resulting actions through the driver
    ///
    /// Returns the final App state.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render. Failed intents
    /// are not errors; see [`Driver::execute`].
    pub async fn run(mut self) -> Result<App, D::Error> {
        self.driver.render(&self.app)?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(self.app)
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let now = self.env.now();
        let actions = self.driver.poll_event(&mut self.app, now).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        if let Some(batch) = self.driver.recv_batch().await
            && self.process_batch(batch).await?
        {
            return Ok(true);
        }

        Ok(false)
    }

    /// Route a stream batch through the Bridge into the App.
    ///
    /// Returns `true` if should quit.
    async fn process_batch(&mut self, batch: StreamBatch) -> Result<bool, D::Error> {
        let events = self.bridge.process_batch(batch);
        self.process_events(events).await
    }

    /// Feed events to the App and process what it returns.
    async fn process_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Intents update the bridge first so a batch arriving
                    // right after teardown is already stale
                    AppAction::PersistRoom { .. }
                    | AppAction::DeleteInbox { .. }
                    | AppAction::Subscribe { .. }
                    | AppAction::Unsubscribe { .. }
                    | AppAction::SubscribeInbox { .. }
                    | AppAction::UnsubscribeInbox => {
                        self.bridge.process_app_action(&action);
                        if let Err(e) = self.driver.execute(&action).await {
                            tracing::warn!(error = %e, ?action, "intent failed, keeping local state");
                            let message = e.to_string();
                            pending_actions.extend(self.app.handle(AppEvent::Error { message }));
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
