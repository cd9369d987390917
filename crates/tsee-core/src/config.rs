//! Emitter options.
//!
//! `max_listeners` is a leak warning threshold, not a hard limit: adding a
//! listener past it still succeeds, and one warning is logged per channel.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

static DEFAULT_MAX_LISTENERS: AtomicUsize = AtomicUsize::new(10);

/// Threshold applied to emitters built without an explicit `max_listeners`.
pub fn default_max_listeners() -> usize {
    DEFAULT_MAX_LISTENERS.load(Ordering::Relaxed)
}

/// Change the threshold for emitters created afterwards. `0` disables the warning.
pub fn set_default_max_listeners(n: usize) {
    DEFAULT_MAX_LISTENERS.store(n, Ordering::Relaxed);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitterOptions {
    /// Listener count per channel above which a warning is logged.
    /// `None` uses [`default_max_listeners`]; `Some(0)` means unlimited.
    pub max_listeners: Option<usize>,
}

impl EmitterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_listeners(mut self, n: usize) -> Self {
        self.max_listeners = Some(n);
        self
    }

    pub(crate) fn resolved_max_listeners(&self) -> usize {
        self.max_listeners.unwrap_or_else(default_max_listeners)
    }
}
