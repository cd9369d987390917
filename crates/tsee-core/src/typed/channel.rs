//! Channel - チャネル宣言
//!
//! チャネルマップはマーカー型 `M: ChannelMap` で表します。
//! 各チャネルは独自の型 `C: Channel` で、チャネル名と listener が受け取る
//! 引数タプルを持ちます。`TypedEmitter<M>` がチャネル `C` を扱えるのは
//! `M: Declares<C>` のときだけです。
//!
//! # 学習ポイント
//! - Associated Types (`type Args`) で引数リストをタプルとして表現
//! - マーカー trait (`Declares<C>`) による「宣言済み集合」の表現
//! - `macro_rules!` で宣言をまとめて生成
//!
//! # 使用例
//! ```
//! use tsee_core::{channels, typed::Channel};
//!
//! channels! {
//!     pub ChatEvents {
//!         Greet("greet") => (String,),
//!         Tick("tick") => (),
//!     }
//! }
//!
//! assert_eq!(Greet::name().to_string(), "greet");
//! ```
//!
//! Only callable entries can be declared. A plain value is a compile error:
//! ```compile_fail
//! tsee_core::channels! {
//!     Counter {
//!         Count("count") = usize,
//!     }
//! }
//! ```

use crate::channel::ChannelName;

/// A named channel and the argument tuple its listeners take.
pub trait Channel: 'static {
    /// Argument list as a tuple: `()`, `(T,)`, `(T, U)`, ...
    type Args: 'static;

    fn name() -> ChannelName;
}

/// Marker for a set of channels.
pub trait ChannelMap: 'static {}

/// `Self` includes channel `C`.
pub trait Declares<C: Channel>: ChannelMap {}

/// Fired before a listener is added. Declared by every map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NewListener;

impl Channel for NewListener {
    type Args = (ChannelName,);

    fn name() -> ChannelName {
        ChannelName::NEW_LISTENER
    }
}

/// Fired after a listener is removed. Declared by every map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RemoveListener;

impl Channel for RemoveListener {
    type Args = (ChannelName,);

    fn name() -> ChannelName {
        ChannelName::REMOVE_LISTENER
    }
}

impl<M: ChannelMap> Declares<NewListener> for M {}
impl<M: ChannelMap> Declares<RemoveListener> for M {}

/// Declare a channel map and its channels.
///
/// Each entry is `Type("name") => (Args, ..)` for a string channel or
/// `Type(symbol "description") => (Args, ..)` for a symbol channel. The
/// macro emits one unit struct per channel, the map marker struct, and the
/// `Channel`/`Declares` impls tying them together.
#[macro_export]
macro_rules! channels {
    (@name symbol $description:literal) => {{
        static SYMBOL: ::std::sync::OnceLock<$crate::channel::Symbol> =
            ::std::sync::OnceLock::new();
        $crate::channel::ChannelName::Symbol(
            *SYMBOL.get_or_init(|| $crate::channel::Symbol::new($description)),
        )
    }};
    (@name $name:literal) => {
        $crate::channel::ChannelName::from_static($name)
    };
    (
        $(#[$map_meta:meta])*
        $vis:vis $map:ident {
            $(
                $(#[$meta:meta])*
                $channel:ident ( $($name:tt)+ ) => ( $($arg:ty),* $(,)? )
            ),* $(,)?
        }
    ) => {
        $(#[$map_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $map;

        impl $crate::typed::ChannelMap for $map {}

        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            $vis struct $channel;

            impl $crate::typed::Channel for $channel {
                type Args = ( $($arg,)* );

                fn name() -> $crate::channel::ChannelName {
                    $crate::channels!(@name $($name)+)
                }
            }

            impl $crate::typed::Declares<$channel> for $map {}
        )*
    };
}
