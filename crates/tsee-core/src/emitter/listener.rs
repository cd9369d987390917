//! Type-erased listener.
//!
//! `AnyListener` is the object the registry stores. Its identity is the
//! identity of the shared closure, so clones of one listener match each
//! other in `off` while two separately built listeners never do, even when
//! built from the same function.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

use crate::channel::ChannelName;
use crate::error::{EmitterError, ListenerError, ListenerResult};

pub(crate) enum Failure {
    Mismatch(&'static str),
    Failed(ListenerError),
}

impl Failure {
    pub(crate) fn into_emitter_error(self, channel: ChannelName) -> EmitterError {
        match self {
            Failure::Mismatch(expected) => EmitterError::ArgumentMismatch { channel, expected },
            Failure::Failed(source) => EmitterError::Listener { channel, source },
        }
    }
}

type ErasedFn = dyn Fn(&dyn Any) -> Result<(), Failure> + Send + Sync;

#[derive(Clone)]
pub struct AnyListener {
    f: Arc<ErasedFn>,
}

impl AnyListener {
    /// Listener that inspects its arguments itself.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Any) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move |args: &dyn Any| f(args).map_err(Failure::Failed)),
        }
    }

    /// Listener that only accepts argument tuples of type `A`.
    pub(crate) fn typed<A, F>(f: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(move |args: &dyn Any| match args.downcast_ref::<A>() {
                Some(args) => f(args).map_err(Failure::Failed),
                None => Err(Failure::Mismatch(type_name::<A>())),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &AnyListener) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    pub(crate) fn call(&self, args: &dyn Any) -> Result<(), Failure> {
        (self.f)(args)
    }

    pub(crate) fn downgrade(&self) -> WeakListener {
        WeakListener(Arc::downgrade(&self.f))
    }
}

/// Non-owning listener handle; does not keep the closure alive.
pub(crate) struct WeakListener(Weak<ErasedFn>);

impl WeakListener {
    pub(crate) fn upgrade(&self) -> Option<AnyListener> {
        self.0.upgrade().map(|f| AnyListener { f })
    }
}

impl fmt::Debug for AnyListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyListener")
            .field("ptr", &Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let a = AnyListener::new(|_| Ok(()));
        let b = a.clone();
        let c = AnyListener::new(|_| Ok(()));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn typed_listener_rejects_other_argument_types() {
        let l = AnyListener::typed::<(u32,), _>(|_| Ok(()));
        assert!(l.call(&(1u32,)).is_ok());

        match l.call(&("nope",)) {
            Err(Failure::Mismatch(expected)) => assert!(expected.contains("u32")),
            _ => panic!("expected argument mismatch"),
        }
    }

    #[test]
    fn weak_handle_dies_with_last_listener() {
        let l = AnyListener::new(|_| Ok(()));
        let weak = l.downgrade();
        assert!(weak.upgrade().is_some_and(|u| u.ptr_eq(&l)));
        drop(l);
        assert!(weak.upgrade().is_none());
    }
}
