use thiserror::Error;

use crate::channel::ChannelName;

/// Error a listener hands back to the emitter.
///
/// Listeners own their failure type; the emitter only forwards it to the
/// caller of `emit`.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by every listener.
pub type ListenerResult = Result<(), ListenerError>;

#[derive(Debug, Error)]
pub enum EmitterError {
    /// A listener failed. The emit stopped at that listener.
    #[error("listener for channel {channel} failed: {source}")]
    Listener {
        channel: ChannelName,
        #[source]
        source: ListenerError,
    },

    /// Untyped emit passed arguments a typed listener cannot read.
    #[error("listener for channel {channel} expected arguments of type {expected}")]
    ArgumentMismatch {
        channel: ChannelName,
        expected: &'static str,
    },

    /// The "error" channel was emitted with nobody listening.
    #[error("unhandled error emitted on channel {channel}")]
    UnhandledError { channel: ChannelName },

    /// The emitter went away before an awaited emission arrived.
    #[error("emitter closed before channel {channel} fired")]
    Closed { channel: ChannelName },
}

impl EmitterError {
    pub fn channel(&self) -> &ChannelName {
        match self {
            Self::Listener { channel, .. }
            | Self::ArgumentMismatch { channel, .. }
            | Self::UnhandledError { channel }
            | Self::Closed { channel } => channel,
        }
    }
}
