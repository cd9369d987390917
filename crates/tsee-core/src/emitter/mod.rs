//! Untyped event emitter.
//!
//! `EventEmitter` stores listeners per [`ChannelName`] and calls them
//! synchronously from `emit`. Arguments travel as `&dyn Any`; the typed
//! facade in [`crate::typed`] is what pins each channel to one argument
//! tuple.
//!
//! # Dispatch rules
//! - Each channel keeps one ordered list. `on`/`once` append, the
//!   `prepend_*` variants insert at the front.
//! - `emit` snapshots the list, then walks it front to back without holding
//!   the registry lock. Listeners may register, remove or emit re-entrantly;
//!   such changes apply to later emits only.
//! - A once registration is removed right before its only invocation.
//! - The first failing listener stops the emit and its error is returned.
//! - Emitting on `"error"` with nobody listening is an error.
//! - `"newListener"` fires before an insertion and `"removeListener"` after a
//!   removal, both with `(ChannelName,)` as arguments.

mod listener;
mod registry;

pub use self::listener::AnyListener;
pub(crate) use self::listener::WeakListener;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use self::registry::{Registration, Registry};
use crate::channel::ChannelName;
use crate::config::EmitterOptions;
use crate::error::EmitterError;

struct Shared {
    registry: Mutex<Registry>,
}

/// Handle to one listener table. Clones share the table.
#[derive(Clone)]
pub struct EventEmitter {
    shared: Arc<Shared>,
}

/// Non-owning handle; does not keep listeners alive.
///
/// Listeners that call back into their own emitter capture one of these.
/// A strong clone inside a listener forms a cycle through the registry and
/// the table is never freed.
#[derive(Clone)]
pub struct WeakEmitter {
    shared: Weak<Shared>,
}

impl WeakEmitter {
    /// `None` once every strong handle is gone.
    pub fn upgrade(&self) -> Option<EventEmitter> {
        self.shared.upgrade().map(|shared| EventEmitter { shared })
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry::new(options.resolved_max_listeners())),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            shared: Arc::downgrade(&self.shared),
        }
    }

    // Listeners never run under this lock, so a poisoned guard still holds a
    // consistent table.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on(&self, channel: impl Into<ChannelName>, listener: &AnyListener) -> &Self {
        self.add(channel.into(), listener, false, false)
    }

    pub fn add_listener(&self, channel: impl Into<ChannelName>, listener: &AnyListener) -> &Self {
        self.on(channel, listener)
    }

    pub fn once(&self, channel: impl Into<ChannelName>, listener: &AnyListener) -> &Self {
        self.add(channel.into(), listener, true, false)
    }

    pub fn prepend_listener(
        &self,
        channel: impl Into<ChannelName>,
        listener: &AnyListener,
    ) -> &Self {
        self.add(channel.into(), listener, false, true)
    }

    pub fn prepend_once_listener(
        &self,
        channel: impl Into<ChannelName>,
        listener: &AnyListener,
    ) -> &Self {
        self.add(channel.into(), listener, true, true)
    }

    fn add(&self, channel: ChannelName, listener: &AnyListener, once: bool, prepend: bool) -> &Self {
        self.notify(&ChannelName::NEW_LISTENER, &channel);

        let (crossed, max) = {
            let mut registry = self.registry();
            let crossed = registry.insert(
                channel.clone(),
                Registration::new(listener.clone(), once),
                prepend,
            );
            (crossed, registry.max_listeners())
        };

        tracing::debug!(channel = %channel, once, prepend, "listener added");
        if let Some(count) = crossed {
            tracing::warn!(
                channel = %channel,
                count,
                max,
                "possible listener leak: {count} listeners on channel {channel}, raise max_listeners if this is intended"
            );
        }
        self
    }

    /// Remove the earliest registration of `listener` on `channel`.
    /// Does nothing if there is none.
    pub fn off(&self, channel: impl Into<ChannelName>, listener: &AnyListener) -> &Self {
        let channel = channel.into();
        let removed = self.registry().remove_first(&channel, listener);
        if removed.is_some() {
            tracing::debug!(channel = %channel, "listener removed");
            self.notify(&ChannelName::REMOVE_LISTENER, &channel);
        }
        self
    }

    pub fn remove_listener(&self, channel: impl Into<ChannelName>, listener: &AnyListener) -> &Self {
        self.off(channel, listener)
    }

    /// Remove every listener of `channel`, or of every channel when `None`.
    ///
    /// `"removeListener"` listeners are notified for each removal and are
    /// themselves removed last.
    pub fn remove_all_listeners(&self, channel: Option<ChannelName>) -> &Self {
        match channel {
            Some(channel) => self.drain(&channel),
            None => {
                let names = self.registry().names();
                for channel in names.iter().filter(|c| **c != ChannelName::REMOVE_LISTENER) {
                    self.drain(channel);
                }
                self.drain(&ChannelName::REMOVE_LISTENER);
            }
        }
        self
    }

    fn drain(&self, channel: &ChannelName) {
        let removed = self.registry().take(channel);
        if removed.is_empty() {
            return;
        }
        tracing::debug!(channel = %channel, count = removed.len(), "listeners cleared");
        for _ in removed.iter().rev() {
            self.notify(&ChannelName::REMOVE_LISTENER, channel);
        }
    }

    /// Call every listener of `channel` with `args`.
    ///
    /// Returns `Ok(true)` if at least one listener ran.
    pub fn emit(&self, channel: impl Into<ChannelName>, args: &dyn Any) -> Result<bool, EmitterError> {
        let channel = channel.into();
        let snapshot = self.registry().snapshot(&channel);
        if snapshot.is_empty() {
            if channel == ChannelName::ERROR {
                return Err(EmitterError::UnhandledError { channel });
            }
            return Ok(false);
        }

        tracing::trace!(channel = %channel, listeners = snapshot.len(), "emit");
        let mut invoked = false;
        for registration in snapshot {
            if !registration.claim() {
                continue;
            }
            if registration.once {
                let removed = self.registry().remove_registration(&channel, &registration);
                if removed {
                    self.notify(&ChannelName::REMOVE_LISTENER, &channel);
                }
            }
            invoked = true;
            registration
                .listener
                .call(args)
                .map_err(|failure| failure.into_emitter_error(channel.clone()))?;
        }
        Ok(invoked)
    }

    // Meta-listener failures cannot surface through `on`/`off`, so they are
    // logged and dropped.
    fn notify(&self, meta: &ChannelName, channel: &ChannelName) {
        let args = (channel.clone(),);
        if let Err(err) = self.emit(meta.clone(), &args) {
            tracing::warn!(meta = %meta, channel = %channel, error = %err, "meta listener failed");
        }
    }

    pub fn listener_count(&self, channel: impl Into<ChannelName>) -> usize {
        self.registry().count(&channel.into())
    }

    /// Listeners of `channel` in call order. Once registrations appear as
    /// the listener they were registered with.
    pub fn listeners(&self, channel: impl Into<ChannelName>) -> Vec<AnyListener> {
        self.registry()
            .snapshot(&channel.into())
            .into_iter()
            .map(|r| r.listener.clone())
            .collect()
    }

    /// Channels that currently have listeners, in first-registration order.
    pub fn channel_names(&self) -> Vec<ChannelName> {
        self.registry().names()
    }

    pub fn set_max_listeners(&self, n: usize) -> &Self {
        self.registry().set_max_listeners(n);
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.registry().max_listeners()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        let mut map = f.debug_map();
        for name in registry.names() {
            let count = registry.count(&name);
            map.entry(&name, &count);
        }
        map.finish()
    }
}
