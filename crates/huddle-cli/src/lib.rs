//! Script replay for Huddle
//!
//! Drives the production [`huddle_app::Runtime`] from a JSON-lines script of
//! user actions and stream deliveries, then reports the final view state.
//!
//! # Components
//!
//! - [`parse_script`]: script loading with per-line errors
//! - [`ReplayDriver`]: [`huddle_app::Driver`] fed by script steps
//! - [`ReplayClock`]: deterministic clock with scripted advances
//! - [`ViewState`]: serializable final view

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod clock;
mod error;
mod replay;
mod script;
mod view;

pub use clock::ReplayClock;
pub use error::ReplayError;
pub use replay::{ReplayDriver, ReplayOptions, replay};
pub use script::{ScriptStep, parse_script};
pub use view::ViewState;
