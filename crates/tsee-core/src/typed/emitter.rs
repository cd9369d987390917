//! TypedEmitter - 1 つのチャネルマップに絞り込んだ `EventEmitter`
//!
//! すべてのメソッドは内部の [`EventEmitter`] の同名メソッドに委譲します。
//! この層が追加するのは「チャネルが `M` に属し、listener と引数が
//! チャネルのタプルと一致する」ことのコンパイル時チェックだけです。
//!
//! # 学習ポイント
//! - Generic methods + where 句 (`M: Declares<C>`) による静的な制約
//! - 実行時の振る舞いを持たない薄い facade
//!
//! An undeclared channel does not compile:
//! ```compile_fail
//! use tsee_core::{channels, typed::TypedEmitter};
//!
//! channels! { Chat { Greet("greet") => (String,), } }
//! channels! { Clock { Tick("tick") => (), } }
//!
//! let chat = TypedEmitter::<Chat>::new();
//! chat.emit(Tick, ()).unwrap();
//! ```
//!
//! Neither do arguments of the wrong shape:
//! ```compile_fail
//! use tsee_core::{channels, typed::TypedEmitter};
//!
//! channels! { Chat { Greet("greet") => (String,), } }
//!
//! let chat = TypedEmitter::<Chat>::new();
//! chat.emit(Greet, (42u32,)).unwrap();
//! ```
//!
//! Nor does a listener written for another channel:
//! ```compile_fail
//! use tsee_core::{channels, typed::{Listener, TypedEmitter}};
//!
//! channels! { Chat { Greet("greet") => (String,), Move("move") => (i32, i32), } }
//!
//! let chat = TypedEmitter::<Chat>::new();
//! let l = Listener::<Move>::new(|_| Ok(()));
//! chat.on(Greet, &l);
//! ```
//!
//! A listener that re-enters its own emitter should hold a
//! [`WeakTypedEmitter`]; a strong clone keeps the listener table alive
//! through the listener itself.

use std::fmt;
use std::marker::PhantomData;

use super::channel::{Channel, ChannelMap, Declares};
use super::listener::Listener;
use crate::channel::ChannelName;
use crate::config::EmitterOptions;
use crate::emitter::{EventEmitter, WeakEmitter};
use crate::error::EmitterError;

pub struct TypedEmitter<M: ChannelMap> {
    inner: EventEmitter,
    _map: PhantomData<fn() -> M>,
}

impl<M: ChannelMap> TypedEmitter<M> {
    pub fn new() -> Self {
        Self::from_untyped(EventEmitter::new())
    }

    pub fn with_options(options: EmitterOptions) -> Self {
        Self::from_untyped(EventEmitter::with_options(options))
    }

    /// Wrap an existing emitter. Listeners registered on it through the
    /// untyped API must agree with `M`, or emits fail with
    /// [`EmitterError::ArgumentMismatch`].
    pub fn from_untyped(inner: EventEmitter) -> Self {
        Self {
            inner,
            _map: PhantomData,
        }
    }

    pub fn as_untyped(&self) -> &EventEmitter {
        &self.inner
    }

    pub fn into_untyped(self) -> EventEmitter {
        self.inner
    }

    /// Handle that does not keep the listener table alive.
    pub fn downgrade(&self) -> WeakTypedEmitter<M> {
        WeakTypedEmitter {
            inner: self.inner.downgrade(),
            _map: PhantomData,
        }
    }

    pub fn on<C>(&self, _channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.on(C::name(), listener.as_any());
        self
    }

    pub fn add_listener<C>(&self, channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.on(channel, listener)
    }

    pub fn once<C>(&self, _channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.once(C::name(), listener.as_any());
        self
    }

    pub fn prepend_listener<C>(&self, _channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.prepend_listener(C::name(), listener.as_any());
        self
    }

    pub fn prepend_once_listener<C>(&self, _channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.prepend_once_listener(C::name(), listener.as_any());
        self
    }

    pub fn off<C>(&self, _channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.off(C::name(), listener.as_any());
        self
    }

    pub fn remove_listener<C>(&self, channel: C, listener: &Listener<C>) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.off(channel, listener)
    }

    /// Remove every listener of one channel.
    pub fn remove_all<C>(&self, _channel: C) -> &Self
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.remove_all_listeners(Some(C::name()));
        self
    }

    /// Remove every listener of every channel.
    pub fn clear(&self) -> &Self {
        self.inner.remove_all_listeners(None);
        self
    }

    pub fn emit<C>(&self, _channel: C, args: C::Args) -> Result<bool, EmitterError>
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.emit(C::name(), &args)
    }

    pub fn listener_count<C>(&self, _channel: C) -> usize
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner.listener_count(C::name())
    }

    pub fn listeners<C>(&self, _channel: C) -> Vec<Listener<C>>
    where
        C: Channel,
        M: Declares<C>,
    {
        self.inner
            .listeners(C::name())
            .into_iter()
            .map(Listener::from_any)
            .collect()
    }

    pub fn channel_names(&self) -> Vec<ChannelName> {
        self.inner.channel_names()
    }

    pub fn set_max_listeners(&self, n: usize) -> &Self {
        self.inner.set_max_listeners(n);
        self
    }

    pub fn max_listeners(&self) -> usize {
        self.inner.max_listeners()
    }
}

/// Non-owning [`TypedEmitter`] handle.
pub struct WeakTypedEmitter<M: ChannelMap> {
    inner: WeakEmitter,
    _map: PhantomData<fn() -> M>,
}

impl<M: ChannelMap> WeakTypedEmitter<M> {
    /// `None` once every strong handle is gone.
    pub fn upgrade(&self) -> Option<TypedEmitter<M>> {
        self.inner.upgrade().map(TypedEmitter::from_untyped)
    }
}

impl<M: ChannelMap> Clone for WeakTypedEmitter<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _map: PhantomData,
        }
    }
}

impl<M: ChannelMap> Clone for TypedEmitter<M> {
    fn clone(&self) -> Self {
        Self::from_untyped(self.inner.clone())
    }
}

impl<M: ChannelMap> Default for TypedEmitter<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ChannelMap> fmt::Debug for TypedEmitter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEmitter")
            .field("map", &std::any::type_name::<M>())
            .field("channels", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::AnyListener;
    use crate::typed::{NewListener, RemoveListener};
    use std::sync::{Arc, Mutex};

    crate::channels! {
        Chat {
            Greet("greet") => (String,),
            Tick("tick") => (),
            Ping("ping") => (),
            Move("move") => (i32, i32),
            Error("error") => (String,),
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    fn tagged<C: Channel>(log: &Log, tag: &'static str) -> Listener<C> {
        let log = log.clone();
        Listener::new(move |_| {
            log.lock().unwrap().push(tag.to_string());
            Ok(())
        })
    }

    #[test]
    fn greet_listener_receives_arguments() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();

        let sink = log.clone();
        em.on(
            Greet,
            &Listener::new(move |(name,): &(String,)| {
                sink.lock().unwrap().push(format!("hello {name}"));
                Ok(())
            }),
        );

        assert!(em.emit(Greet, ("bob".to_string(),)).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["hello bob"]);
    }

    #[test]
    fn plain_listeners_fire_in_order_on_every_emit() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.on(Tick, &tagged(&log, "A")).on(Tick, &tagged(&log, "B"));

        em.emit(Tick, ()).unwrap();
        em.emit(Tick, ()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "A", "B"]);
    }

    #[test]
    fn once_listener_fires_once() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.once(Ping, &tagged(&log, "C"));

        assert!(em.emit(Ping, ()).unwrap());
        assert!(!em.emit(Ping, ()).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["C"]);
    }

    #[test]
    fn prepended_listener_fires_before_existing_one() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.on(Tick, &tagged(&log, "B"));
        em.prepend_listener(Tick, &tagged(&log, "D"));

        em.emit(Tick, ()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["D", "B"]);
    }

    #[test]
    fn prepend_once_then_gone() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.on(Tick, &tagged(&log, "B"));
        em.prepend_once_listener(Tick, &tagged(&log, "P"));

        em.emit(Tick, ()).unwrap();
        em.emit(Tick, ()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["P", "B", "B"]);
    }

    #[test]
    fn off_unknown_listener_is_noop() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        let h = tagged::<Tick>(&log, "H");

        em.off(Tick, &h).remove_listener(Tick, &h);
        em.on(Tick, &h).off(Tick, &h);
        assert!(!em.emit(Tick, ()).unwrap());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_empties_every_channel() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.on(Tick, &tagged(&log, "T"))
            .on(Ping, &tagged(&log, "P"))
            .add_listener(Move, &tagged(&log, "M"));

        em.clear();
        assert!(!em.emit(Tick, ()).unwrap());
        assert!(!em.emit(Ping, ()).unwrap());
        assert!(!em.emit(Move, (1, 2)).unwrap());
        assert!(log.lock().unwrap().is_empty());
        assert!(em.channel_names().is_empty());
    }

    #[test]
    fn remove_all_touches_one_channel() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        em.on(Tick, &tagged(&log, "T")).on(Ping, &tagged(&log, "P"));

        em.remove_all(Tick);
        assert_eq!(em.listener_count(Tick), 0);
        assert_eq!(em.listener_count(Ping), 1);
        assert_eq!(em.channel_names(), vec![ChannelName::from("ping")]);
    }

    #[test]
    fn listener_error_reaches_emit_caller() {
        let em = TypedEmitter::<Chat>::new();
        em.on(
            Move,
            &Listener::new(|&(x, y): &(i32, i32)| {
                if x < 0 || y < 0 {
                    return Err(format!("off board: {x},{y}").into());
                }
                Ok(())
            }),
        );

        assert!(em.emit(Move, (1, 1)).unwrap());
        let err = em.emit(Move, (-1, 0)).unwrap_err();
        assert!(err.to_string().contains("off board"));
    }

    #[test]
    fn error_channel_needs_a_listener() {
        let em = TypedEmitter::<Chat>::new();
        let err = em.emit(Error, ("bad".to_string(),)).unwrap_err();
        assert!(matches!(err, EmitterError::UnhandledError { .. }));

        em.on(Error, &Listener::new(|_| Ok(())));
        assert!(em.emit(Error, ("bad".to_string(),)).unwrap());
    }

    #[test]
    fn listeners_round_trip_identity() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();
        let t = tagged::<Tick>(&log, "T");
        em.on(Tick, &t);

        let listed = em.listeners(Tick);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].ptr_eq(&t));
        em.off(Tick, &listed[0]);
        assert_eq!(em.listener_count(Tick), 0);
    }

    #[test]
    fn meta_channels_are_typed() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();

        let sink = log.clone();
        em.on(
            NewListener,
            &Listener::new(move |(channel,): &(ChannelName,)| {
                sink.lock().unwrap().push(format!("+{channel}"));
                Ok(())
            }),
        );
        let sink = log.clone();
        em.on(
            RemoveListener,
            &Listener::new(move |(channel,): &(ChannelName,)| {
                sink.lock().unwrap().push(format!("-{channel}"));
                Ok(())
            }),
        );
        log.lock().unwrap().clear();

        let g = Listener::<Greet>::new(|_| Ok(()));
        em.on(Greet, &g).off(Greet, &g);
        assert_eq!(*log.lock().unwrap(), vec!["+greet", "-greet"]);
    }

    #[test]
    fn untyped_listener_with_wrong_arguments_is_reported() {
        let em = TypedEmitter::<Chat>::new();
        em.as_untyped()
            .on("greet", &AnyListener::new(|_| Ok(())));
        em.on(Greet, &Listener::new(|_| Ok(())));

        // A typed listener fed a foreign tuple through the untyped API.
        let err = em.as_untyped().emit("greet", &(7u8,)).unwrap_err();
        assert!(matches!(err, EmitterError::ArgumentMismatch { .. }));
    }

    #[test]
    fn clones_share_listeners() {
        let em = TypedEmitter::<Chat>::new();
        let other = em.clone();
        let log: Log = Arc::default();
        other.on(Tick, &tagged(&log, "T"));
        assert_eq!(em.listener_count(Tick), 1);
        assert_eq!(em.into_untyped().listener_count("tick"), 1);
    }

    #[test]
    fn weak_handle_lets_listener_reenter_without_leaking() {
        let em = TypedEmitter::<Chat>::new();
        let log: Log = Arc::default();

        let weak = em.downgrade();
        let sink = log.clone();
        em.on(
            Tick,
            &Listener::new(move |_| {
                sink.lock().unwrap().push("tick".to_string());
                if let Some(em) = weak.upgrade() {
                    em.emit(Ping, ())?;
                }
                Ok(())
            }),
        );
        em.on(Ping, &tagged(&log, "ping"));

        assert!(em.emit(Tick, ()).unwrap());
        assert_eq!(*log.lock().unwrap(), vec!["tick", "ping"]);

        let weak = em.downgrade();
        assert!(weak.clone().upgrade().is_some());
        drop(em);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn options_carry_through() {
        let em = TypedEmitter::<Chat>::with_options(EmitterOptions::new().with_max_listeners(2));
        assert_eq!(em.max_listeners(), 2);
        em.set_max_listeners(5);
        assert_eq!(em.max_listeners(), 5);
    }
}
