//! Engine Configuration
//!
//! Configuration is per thread, like the active-subscriber stack. Hosts set
//! it once at startup, usually from a JSON blob shipped with the app.

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::error::ObserveError;

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Runtime switches for the observation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emit diagnostics for skipped mutations and silent no-ops.
    pub verbose: bool,

    /// The current thread renders in a non-interactive context (e.g. to a
    /// string on a server). Observation is declined unless mock is forced.
    pub server_rendering: bool,

    /// Install the sequence interceptor even for mock observers, so array
    /// mutations remain trackable in non-interactive contexts.
    pub mock_tracks_arrays: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: cfg!(debug_assertions),
            server_rendering: false,
            mock_tracks_arrays: false,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Replace the configuration for the current thread.
pub fn configure(config: Config) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// A copy of the current thread's configuration.
pub fn config() -> Config {
    CONFIG.with(|c| c.borrow().clone())
}

pub(crate) fn is_verbose() -> bool {
    CONFIG.with(|c| c.borrow().verbose)
}

pub(crate) fn is_server_rendering() -> bool {
    CONFIG.with(|c| c.borrow().server_rendering)
}

pub(crate) fn mock_tracks_arrays() -> bool {
    CONFIG.with(|c| c.borrow().mock_tracks_arrays)
}

/// Suspend or resume automatic observation.
///
/// Only affects subsequent `observe` calls; reactivity that is already
/// installed keeps working.
pub fn toggle_observing(enabled: bool) {
    SHOULD_OBSERVE.with(|s| s.set(enabled));
}

/// Whether `observe` currently creates new observers.
pub fn should_observe() -> bool {
    SHOULD_OBSERVE.with(|s| s.get())
}

pub(crate) fn report(err: &ObserveError) {
    if is_verbose() {
        tracing::warn!(error = %err, "mutation skipped");
    }
}
