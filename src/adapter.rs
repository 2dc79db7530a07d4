//! Adapters store values the gateway has no native operation for.

use std::fmt::Display;
use std::str::FromStr;

use futures::StreamExt;

use crate::{Gateway, Observable};

/// Marshals a custom value type through the scalar gateway operations.
///
/// Bound in a preference trait with `#[adapter(T => MyAdapter)]`. The generated
/// code passes the key, the declared default and the gateway through unchanged.
pub trait PreferenceAdapter<T> {
    fn observe(key: &str, default: T, gateway: &dyn Gateway) -> Observable<T>;

    fn get(key: &str, default: T, gateway: &dyn Gateway) -> T;

    fn put(key: &str, value: T, gateway: &dyn Gateway);
}

/// Stores any value as its [`Display`] form and reads it back with [`FromStr`].
///
/// A stored string that no longer parses reads as the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseAdapter;

impl<T> PreferenceAdapter<T> for ParseAdapter
where
    T: FromStr + Display + Clone + Send + 'static,
{
    fn observe(key: &str, default: T, gateway: &dyn Gateway) -> Observable<T> {
        let key_owned = key.to_owned();
        gateway
            .observe_string(key, &default.to_string())
            .map(move |raw| parse_or(&key_owned, &raw, default.clone()))
            .boxed()
    }

    fn get(key: &str, default: T, gateway: &dyn Gateway) -> T {
        let raw = gateway.get_string(key, &default.to_string());
        parse_or(key, &raw, default)
    }

    fn put(key: &str, value: T, gateway: &dyn Gateway) {
        gateway.put_string(key, &value.to_string())
    }
}

fn parse_or<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(key, raw, "stored preference does not parse, using the default");
        default
    })
}
