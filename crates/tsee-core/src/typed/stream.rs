//! Stream - 型付き emitter の async アダプタ
//!
//! 配送自体は同期のままです。ここでは引数の clone を tokio の channel に
//! 転送する通常の listener を登録し、async 側から emit を待てるようにします。
//!
//! # 学習ポイント
//! - `oneshot` / `mpsc` による同期 → 非同期の橋渡し
//! - RAII (`Drop`) による購読解除

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use super::channel::{Channel, ChannelMap, Declares};
use super::emitter::TypedEmitter;
use super::listener::Listener;
use crate::emitter::{WeakEmitter, WeakListener};
use crate::error::EmitterError;

impl<M: ChannelMap> TypedEmitter<M> {
    /// Resolve with the arguments of the next emit on `channel`.
    ///
    /// The once-listener is registered immediately, not on first poll.
    /// Fails with [`EmitterError::Closed`] if that listener is dropped
    /// without firing (emitter dropped or channel cleared).
    pub fn wait_for<C>(
        &self,
        channel: C,
    ) -> impl Future<Output = Result<C::Args, EmitterError>> + Send + use<M, C>
    where
        C: Channel,
        C::Args: Clone + Send,
        M: Declares<C>,
    {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let listener = Listener::<C>::new(move |args| {
            let tx = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(tx) = tx {
                // Receiver gone means nobody is waiting any more.
                let _ = tx.send(args.clone());
            }
            Ok(())
        });
        self.once(channel, &listener);

        async move { rx.await.map_err(|_| EmitterError::Closed { channel: C::name() }) }
    }

    /// Receive every emit on `channel` until the subscription is dropped.
    pub fn subscribe<C>(&self, channel: C) -> Subscription<C>
    where
        C: Channel,
        C::Args: Clone + Send,
        M: Declares<C>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Listener::<C>::new(move |args| {
            let _ = tx.send(args.clone());
            Ok(())
        });
        self.on(channel, &listener);

        Subscription {
            rx,
            listener: listener.as_any().downgrade(),
            emitter: self.as_untyped().downgrade(),
        }
    }
}

/// Stream of one channel's arguments. Unregisters on drop.
///
/// Holds no strong reference to its listener or the emitter: once the
/// listener is removed (`clear`, `remove_all`) or the emitter is dropped,
/// `recv` drains what was buffered and then returns `None`.
pub struct Subscription<C: Channel> {
    rx: mpsc::UnboundedReceiver<C::Args>,
    listener: WeakListener,
    emitter: WeakEmitter,
}

impl<C: Channel> Subscription<C> {
    pub async fn recv(&mut self) -> Option<C::Args> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<C::Args> {
        self.rx.try_recv().ok()
    }
}

impl<C: Channel> Drop for Subscription<C> {
    fn drop(&mut self) {
        let (Some(emitter), Some(listener)) =
            (self.emitter.upgrade(), self.listener.upgrade())
        else {
            return;
        };
        emitter.off(C::name(), &listener);
    }
}
