//! Listener<C> - 1 つのチャネルの引数タプルに束縛された listener
//!
//! クロージャは `&C::Args` をそのまま受け取ります。内部では
//! [`AnyListener`] が型消去された引数を downcast するので、
//! untyped emitter は他の listener と同じように保存できます。
//!
//! # 学習ポイント
//! - Phantom type (`PhantomData<fn(C)>`) で実行時コストなしにチャネルを区別
//! - Type erasure パターン (`Listener<C>` → `AnyListener`)

use std::fmt;
use std::marker::PhantomData;

use super::channel::Channel;
use crate::emitter::AnyListener;
use crate::error::ListenerResult;

/// Typed listener handle.
///
/// Clones share identity: pass a clone of the registered listener to `off`
/// to remove it.
///
/// ```
/// use tsee_core::{channels, typed::{Listener, TypedEmitter}};
///
/// channels! {
///     Chat {
///         Greet("greet") => (String,),
///     }
/// }
///
/// let emitter = TypedEmitter::<Chat>::new();
/// let greet = Listener::<Greet>::new(|(name,)| {
///     println!("hello {name}");
///     Ok(())
/// });
/// emitter.on(Greet, &greet);
/// assert!(emitter.emit(Greet, ("bob".to_string(),)).unwrap());
/// emitter.off(Greet, &greet);
/// assert!(!emitter.emit(Greet, ("bob".to_string(),)).unwrap());
/// ```
pub struct Listener<C: Channel> {
    inner: AnyListener,
    _channel: PhantomData<fn(C)>,
}

impl<C: Channel> Listener<C> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&C::Args) -> ListenerResult + Send + Sync + 'static,
    {
        Self::from_any(AnyListener::typed::<C::Args, F>(f))
    }

    pub(crate) fn from_any(inner: AnyListener) -> Self {
        Self {
            inner,
            _channel: PhantomData,
        }
    }

    pub fn as_any(&self) -> &AnyListener {
        &self.inner
    }

    pub fn ptr_eq(&self, other: &Listener<C>) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<C: Channel> Clone for Listener<C> {
    fn clone(&self) -> Self {
        Self::from_any(self.inner.clone())
    }
}

impl<C: Channel> fmt::Debug for Listener<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("channel", &C::name())
            .field("inner", &self.inner)
            .finish()
    }
}
