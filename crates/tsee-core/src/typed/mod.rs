//! Typed - 型付き Emitter API
//!
//! [`EventEmitter`](crate::emitter::EventEmitter) の上に、チャネル名と
//! 引数の型の対応を静的に保証する層を載せます。
//!
//! # 二層構造
//! - **表層（Typed）**: `Channel`, `ChannelMap`, `Declares`, `Listener<C>`,
//!   `TypedEmitter<M>` - 型安全。チャネルや引数の不一致はコンパイルエラー
//! - **内部（Erased）**: `AnyListener` - 引数の型を問わず保存・呼び出し

pub mod channel;
pub mod emitter;
pub mod listener;
pub mod stream;

pub use self::channel::{Channel, ChannelMap, Declares, NewListener, RemoveListener};
pub use self::emitter::{TypedEmitter, WeakTypedEmitter};
pub use self::listener::Listener;
pub use self::stream::Subscription;
