//! The storage gateway that generated preference types call into.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::GatewayError;

/// Values of one preference: the current value on subscription, then one item
/// per change. Dropping the stream unsubscribes.
pub type Observable<T> = BoxStream<'static, T>;

/// Resolves once a synchronous write has been stored.
pub type Completion = BoxFuture<'static, Result<(), GatewayError>>;

/// Generic access to a key-value preference store.
///
/// A gateway is one storage area. Generated preference types expose the
/// namespace declared on their trait as `NAMESPACE`; open the gateway for that
/// area and hand it to the generated `new`. Keys are passed through as
/// declared, never prefixed.
///
/// Implementations must honour these contracts:
///
/// - `observe_*` streams start with the stored value (or `default` when the key
///   is absent) and then yield the value again each time `key` changes. Change
///   notifications come from one feed shared by every key and subscriber; its
///   backing listener exists only while at least one stream is alive.
/// - `put_*` is fire-and-forget and may return before the value is durable.
/// - `put_*_sync` returns a [`Completion`] that resolves only once the value is
///   durable.
/// - `contains` is a cheap synchronous lookup.
pub trait Gateway {
    fn observe_boolean(&self, key: &str, default: bool) -> Observable<bool>;
    fn observe_float(&self, key: &str, default: f32) -> Observable<f32>;
    fn observe_integer(&self, key: &str, default: i32) -> Observable<i32>;
    fn observe_long(&self, key: &str, default: i64) -> Observable<i64>;
    fn observe_string(&self, key: &str, default: &str) -> Observable<String>;

    fn get_boolean(&self, key: &str, default: bool) -> bool;
    fn get_float(&self, key: &str, default: f32) -> f32;
    fn get_integer(&self, key: &str, default: i32) -> i32;
    fn get_long(&self, key: &str, default: i64) -> i64;
    fn get_string(&self, key: &str, default: &str) -> String;

    fn put_boolean(&self, key: &str, value: bool);
    fn put_float(&self, key: &str, value: f32);
    fn put_integer(&self, key: &str, value: i32);
    fn put_long(&self, key: &str, value: i64);
    fn put_string(&self, key: &str, value: &str);

    fn put_boolean_sync(&self, key: &str, value: bool) -> Completion;
    fn put_float_sync(&self, key: &str, value: f32) -> Completion;
    fn put_integer_sync(&self, key: &str, value: i32) -> Completion;
    fn put_long_sync(&self, key: &str, value: i64) -> Completion;
    fn put_string_sync(&self, key: &str, value: &str) -> Completion;

    fn contains(&self, key: &str) -> bool;
    fn remove(&self, key: &str);
    fn clear(&self);
}

macro_rules! forward_gateway {
    (@scalars $($kind:ident: $arg:ty => $out:ty),* $(,)?) => {
        paste::paste! {$(
            fn [<observe_ $kind>](&self, key: &str, default: $arg) -> Observable<$out> {
                (**self).[<observe_ $kind>](key, default)
            }

            fn [<get_ $kind>](&self, key: &str, default: $arg) -> $out {
                (**self).[<get_ $kind>](key, default)
            }

            fn [<put_ $kind>](&self, key: &str, value: $arg) {
                (**self).[<put_ $kind>](key, value)
            }

            fn [<put_ $kind _sync>](&self, key: &str, value: $arg) -> Completion {
                (**self).[<put_ $kind _sync>](key, value)
            }
        )*}
    };

    ($($wrapper:ty),* $(,)?) => {$(
        impl<G: Gateway + ?Sized> Gateway for $wrapper {
            forward_gateway!(@scalars
                boolean: bool => bool,
                float: f32 => f32,
                integer: i32 => i32,
                long: i64 => i64,
                string: &str => String,
            );

            fn contains(&self, key: &str) -> bool {
                (**self).contains(key)
            }

            fn remove(&self, key: &str) {
                (**self).remove(key)
            }

            fn clear(&self) {
                (**self).clear()
            }
        }
    )*};
}

forward_gateway!(&G, Box<G>, Arc<G>);
