//! tsee-core
//!
//! Typed, synchronous, in-process event emitter.
//!
//! - **channel**: channel identifiers (names and symbols)
//! - **config**: emitter options and the default listener threshold
//! - **emitter**: untyped emitter that stores and calls listeners
//! - **typed**: per-map typed facade, `channels!` macro, async adapters
//! - **error**: emit failures

pub mod channel;
pub mod config;
pub mod emitter;
pub mod error;
pub mod typed;

pub use self::channel::{ChannelName, Symbol};
pub use self::config::{EmitterOptions, default_max_listeners, set_default_max_listeners};
pub use self::emitter::{AnyListener, EventEmitter, WeakEmitter};
pub use self::error::{EmitterError, ListenerError, ListenerResult};
pub use self::typed::{
    Channel, ChannelMap, Declares, Listener, Subscription, TypedEmitter, WeakTypedEmitter,
};
