//! Channel identifiers.
//!
//! A channel is addressed either by a string token or by an opaque
//! [`Symbol`]. Symbols compare by identity: two symbols created with the
//! same description are still different channels.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique channel token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    description: Option<&'static str>,
}

impl Symbol {
    pub fn new(description: &'static str) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Some(description),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        self.description
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.unwrap_or(""))
    }
}

/// Key under which listeners are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelName {
    Name(Cow<'static, str>),
    Symbol(Symbol),
}

impl ChannelName {
    /// Emitted with `(ChannelName,)` before a listener is added.
    pub const NEW_LISTENER: ChannelName = ChannelName::Name(Cow::Borrowed("newListener"));
    /// Emitted with `(ChannelName,)` after a listener is removed.
    pub const REMOVE_LISTENER: ChannelName = ChannelName::Name(Cow::Borrowed("removeListener"));
    /// Emitting here with no listeners is an error.
    pub const ERROR: ChannelName = ChannelName::Name(Cow::Borrowed("error"));

    pub const fn from_static(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }

    pub fn is_meta(&self) -> bool {
        *self == Self::NEW_LISTENER || *self == Self::REMOVE_LISTENER
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&'static str> for ChannelName {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ChannelName {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for ChannelName {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}
