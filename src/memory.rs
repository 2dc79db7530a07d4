//! In-process [`Gateway`] backed by a sorted map.
//!
//! Useful in tests and as the reference for what a gateway has to do. Values
//! can be seeded from and dumped to a TOML snapshot:
//!
//! ```toml
//! [values]
//! dark_mode = { boolean = true }
//! user_name = { string = "ada" }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self, FutureExt};
use futures::stream::{self, StreamExt};
use paste::paste;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::feed::{ChangeFeed, Watched};
use crate::{Completion, Gateway, GatewayError, Observable};

/// A stored preference value, tagged with its storage kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Boolean(bool),
    Float(f32),
    Integer(i32),
    Long(i64),
    String(String),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Float(_) => "float",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::String(_) => "string",
        }
    }
}

/// Conversion between a native scalar and its [`Value`] variant.
trait Scalar: Sized {
    fn from_value(value: &Value) -> Option<Self>;
    fn into_value(self) -> Value;
}

macro_rules! scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    )*};
}

scalar!(
    bool => Boolean,
    f32 => Float,
    i32 => Integer,
    i64 => Long,
    String => String,
);

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

/// A key and what it holds after the change. `None` once removed.
#[derive(Debug, Clone)]
struct Change {
    key: String,
    value: Option<Value>,
}

#[derive(Debug, Default)]
struct Inner {
    values: Mutex<BTreeMap<String, Value>>,
    feed: Arc<ChangeFeed<Change>>,
}

impl Inner {
    fn values(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T: Scalar>(&self, key: &str, default: T) -> T {
        decode(key, self.values().get(key), default)
    }
}

/// Absent keys and values of another kind decode as `default`.
fn decode<T: Scalar>(key: &str, value: Option<&Value>, default: T) -> T {
    match value {
        Some(value) => T::from_value(value).unwrap_or_else(|| {
            warn!(key, stored = value.kind(), "stored preference has another type, using the default");
            default
        }),
        None => default,
    }
}

/// A thread-safe in-memory preference store.
///
/// Clones share the same values and the same change feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from a TOML snapshot.
    pub fn from_toml(snapshot: &str) -> Result<Self, GatewayError> {
        let snapshot: Snapshot = toml::from_str(snapshot)?;
        let gateway = Self::new();
        *gateway.inner.values() = snapshot.values;
        Ok(gateway)
    }

    /// Dumps every stored value as a TOML snapshot.
    pub fn to_toml(&self) -> Result<String, GatewayError> {
        let snapshot = Snapshot {
            values: self.inner.values().clone(),
        };
        Ok(toml::to_string(&snapshot)?)
    }

    /// The raw stored value for `key`, if any.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.values().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values().is_empty()
    }

    /// Whether the shared change listener is currently registered.
    pub fn listener_active(&self) -> bool {
        self.inner.feed.listening()
    }

    /// Number of live observables on this store.
    pub fn subscriber_count(&self) -> usize {
        self.inner.feed.subscriber_count()
    }

    // Changes are published under the values lock so observers see them in
    // write order.
    fn write(&self, key: &str, value: Value) {
        let mut values = self.inner.values();
        if values.get(key) == Some(&value) {
            return;
        }
        trace!(key, kind = value.kind(), "storing preference");
        values.insert(key.to_owned(), value.clone());
        self.inner.feed.publish(Change {
            key: key.to_owned(),
            value: Some(value),
        });
    }

    fn write_sync(&self, key: &str, value: Value) -> Completion {
        self.write(key, value);
        future::ready(Ok(())).boxed()
    }

    fn observe<T>(&self, key: &str, default: T) -> Observable<T>
    where
        T: Scalar + Clone + Send + 'static,
    {
        // Subscribe before reading so no change between the two is lost.
        let (subscription, changes) = self.inner.feed.subscribe();
        let current = self.inner.read(key, default.clone());
        let key = key.to_owned();
        let updates = changes
            .filter(move |change| future::ready(change.key == key))
            .map(move |change| decode(&change.key, change.value.as_ref(), default.clone()));
        let stream = stream::once(future::ready(current)).chain(updates).boxed();
        Watched::new(stream, subscription).boxed()
    }
}

macro_rules! scalar_operations {
    ($($kind:ident: $ty:ty),* $(,)?) => {
        paste! {$(
            fn [<observe_ $kind>](&self, key: &str, default: $ty) -> Observable<$ty> {
                self.observe(key, default)
            }

            fn [<get_ $kind>](&self, key: &str, default: $ty) -> $ty {
                self.inner.read(key, default)
            }

            fn [<put_ $kind>](&self, key: &str, value: $ty) {
                self.write(key, value.into_value())
            }

            fn [<put_ $kind _sync>](&self, key: &str, value: $ty) -> Completion {
                self.write_sync(key, value.into_value())
            }
        )*}
    };
}

impl Gateway for MemoryGateway {
    scalar_operations!(boolean: bool, float: f32, integer: i32, long: i64);

    fn observe_string(&self, key: &str, default: &str) -> Observable<String> {
        self.observe(key, default.to_owned())
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.inner.read(key, default.to_owned())
    }

    fn put_string(&self, key: &str, value: &str) {
        self.write(key, Value::String(value.to_owned()))
    }

    fn put_string_sync(&self, key: &str, value: &str) -> Completion {
        self.write_sync(key, Value::String(value.to_owned()))
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.values().contains_key(key)
    }

    fn remove(&self, key: &str) {
        let mut values = self.inner.values();
        if values.remove(key).is_some() {
            trace!(key, "removed preference");
            self.inner.feed.publish(Change {
                key: key.to_owned(),
                value: None,
            });
        }
    }

    fn clear(&self) {
        let mut values = self.inner.values();
        let removed = std::mem::take(&mut *values);
        trace!(count = removed.len(), "cleared preferences");
        for key in removed.into_keys() {
            self.inner.feed.publish(Change { key, value: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::{block_on, block_on_stream};
    use pretty_assertions::assert_eq;

    #[test]
    fn absent_keys_read_as_the_default() {
        let gateway = MemoryGateway::new();
        assert!(gateway.get_boolean("flag", true));
        assert_eq!(gateway.get_string("name", "anon"), "anon");
        assert!(!gateway.contains("flag"));
    }

    #[test]
    fn values_of_another_kind_read_as_the_default() {
        let gateway = MemoryGateway::new();
        gateway.put_integer("count", 3);
        assert_eq!(gateway.get_long("count", 9), 9);
        assert_eq!(gateway.get_integer("count", 9), 3);
    }

    #[test]
    fn sync_puts_are_stored_when_the_completion_resolves() {
        let gateway = MemoryGateway::new();
        block_on(gateway.put_float_sync("ratio", 0.5)).unwrap();
        assert_eq!(gateway.value("ratio"), Some(Value::Float(0.5)));
    }

    #[test]
    fn observers_see_the_current_value_then_changes() {
        let gateway = MemoryGateway::new();
        gateway.put_long("seen", 1);
        let mut seen = block_on_stream(gateway.observe_long("seen", 0));
        assert_eq!(seen.next(), Some(1));

        gateway.put_long("other", 5);
        gateway.put_long("seen", 2);
        gateway.remove("seen");
        assert_eq!(seen.next(), Some(2));
        assert_eq!(seen.next(), Some(0));
    }

    #[test]
    fn unchanged_writes_do_not_notify() {
        let gateway = MemoryGateway::new();
        let mut names = block_on_stream(gateway.observe_string("name", ""));
        assert_eq!(names.next().as_deref(), Some(""));

        gateway.put_string("name", "ada");
        gateway.put_string("name", "ada");
        gateway.put_string("name", "grace");
        assert_eq!(names.next().as_deref(), Some("ada"));
        assert_eq!(names.next().as_deref(), Some("grace"));
    }

    #[test]
    fn clear_notifies_every_removed_key() {
        let gateway = MemoryGateway::new();
        gateway.put_boolean("a", true);
        gateway.put_boolean("b", true);
        let mut a = block_on_stream(gateway.observe_boolean("a", false));
        let mut b = block_on_stream(gateway.observe_boolean("b", false));
        assert_eq!(a.next(), Some(true));
        assert_eq!(b.next(), Some(true));

        gateway.clear();
        assert!(gateway.is_empty());
        assert_eq!(a.next(), Some(false));
        assert_eq!(b.next(), Some(false));
    }

    #[test]
    fn listener_lives_as_long_as_some_observable() {
        let gateway = MemoryGateway::new();
        assert!(!gateway.listener_active());

        let first = gateway.observe_boolean("a", false);
        let second = gateway.observe_integer("b", 0);
        assert!(gateway.listener_active());
        assert_eq!(gateway.subscriber_count(), 2);

        drop(first);
        assert!(gateway.listener_active());
        drop(second);
        assert!(!gateway.listener_active());
    }

    #[test]
    fn snapshot_seeds_the_store() {
        let gateway = MemoryGateway::from_toml(
            r#"
            [values]
            dark_mode = { boolean = true }
            ratio = { float = 0.25 }
            launches = { integer = 3 }
            installed_at = { long = 1700000000000 }
            user_name = { string = "ada" }
            "#,
        )
        .unwrap();

        assert_eq!(gateway.len(), 5);
        assert!(gateway.get_boolean("dark_mode", false));
        assert_eq!(gateway.get_float("ratio", 0.0), 0.25);
        assert_eq!(gateway.get_integer("launches", 0), 3);
        assert_eq!(gateway.get_long("installed_at", 0), 1_700_000_000_000);
        assert_eq!(gateway.get_string("user_name", ""), "ada");

        let dumped = MemoryGateway::from_toml(&gateway.to_toml().unwrap()).unwrap();
        assert_eq!(dumped.value("user_name"), Some(Value::String("ada".to_owned())));
        assert_eq!(dumped.len(), 5);
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        let err = MemoryGateway::from_toml("[values]\nflag = { colour = true }").unwrap_err();
        assert!(matches!(err, GatewayError::Snapshot(_)));
        assert!(err.to_string().starts_with("invalid preference snapshot"));
    }
}
