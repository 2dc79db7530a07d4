//! # typed_prefs
//!
//! Typed preference accessors generated from an annotated trait.
//!
//! Declare the preferences an application keeps as a trait. Every method says
//! what it does with one key: read it, watch it, write it, check it or remove it.
//! Every key that is read gets its default from an associated constant.
//! `#[preferences]` checks the declaration at compile time and generates a
//! struct implementing the trait on top of any [`Gateway`]:
//!
//! - **Scalars** (`bool`, `f32`, `i32`, `i64` and strings) go straight to the
//!   matching gateway operation.
//! - **Any other type** goes through a [`PreferenceAdapter`] bound with
//!   `#[adapter(Type => Adapter)]`. An unbound type does not compile.
//! - **Mistakes are compile errors:** a missing or ambiguous default, a key
//!   declared with two types, a method with the wrong shape.
//!
//! The generated code holds no state of its own. Each method is a single call
//! into the gateway or the adapter.
//!
//! ## Example
//!
//! ```rust
//! use typed_prefs::futures::executor::block_on_stream;
//! use typed_prefs::{preferences, MemoryGateway, Observable};
//!
//! #[preferences(name = "app")]
//! pub trait AppPreferences {
//!     #[default]
//!     const DEFAULT_NOTIFICATIONS: bool = true;
//!     #[default]
//!     const DEFAULT_USERNAME: &'static str = "guest";
//!
//!     #[get]
//!     fn get_notifications(&self) -> bool;
//!     #[observe]
//!     fn observe_notifications(&self) -> Observable<bool>;
//!     #[set]
//!     fn set_notifications(&self, value: bool);
//!
//!     #[get]
//!     fn get_username(&self) -> String;
//!     #[set]
//!     fn set_username(&self, value: &str);
//! }
//!
//! fn main() {
//!     let prefs = AppPreferencesImpl::new(MemoryGateway::new());
//!     assert_eq!(prefs.get_username(), "guest");
//!
//!     let mut notifications = block_on_stream(prefs.observe_notifications());
//!     assert_eq!(notifications.next(), Some(true));
//!     prefs.set_notifications(false);
//!     assert_eq!(notifications.next(), Some(false));
//! }
//! ```

// Lets the generated code name `::typed_prefs` inside this crate's own tests.
extern crate self as typed_prefs;

// Re-exported so users can consume observables without adding it themselves.
pub use futures;

pub use typed_prefs_codegen::preferences;

mod adapter;
mod error;
mod feed;
mod gateway;
mod memory;

pub use adapter::{ParseAdapter, PreferenceAdapter};
pub use error::GatewayError;
pub use gateway::{Completion, Gateway, Observable};
pub use memory::{MemoryGateway, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::{block_on, block_on_stream};
    use std::fmt;
    use std::str::FromStr;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Theme {
        Light,
        Dark,
    }

    impl fmt::Display for Theme {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Theme::Light => "light",
                Theme::Dark => "dark",
            })
        }
    }

    impl FromStr for Theme {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "light" => Ok(Theme::Light),
                "dark" => Ok(Theme::Dark),
                other => Err(format!("unknown theme `{other}`")),
            }
        }
    }

    #[preferences(name = "test-settings", impl_name = "TestSettings")]
    #[adapter(Theme => ParseAdapter)]
    trait Settings {
        #[default]
        const DEFAULT_THEME: Theme = Theme::Light;
        #[default(name = "launches")]
        const FIRST_LAUNCH_COUNT: i32 = 0;
        #[default]
        const DEFAULT_GREETING: &'static str = "hello";

        #[get]
        fn get_theme(&self) -> Theme;
        #[observe]
        fn observe_theme(&self) -> Observable<Theme>;
        #[set]
        fn set_theme(&self, value: Theme);

        #[get]
        fn get_launches(&self) -> i32;
        #[set_sync]
        fn set_launches_sync(&self, value: i32) -> Completion;

        #[get]
        fn get_greeting(&self) -> String;
        #[set]
        fn set_greeting(&self, value: String);
        #[contains]
        fn has_greeting(&self) -> bool;
        #[remove]
        fn remove_greeting(&self);

        #[contains]
        fn has(&self, key: &str) -> bool;
        #[clear]
        fn reset(&self);
    }

    #[test]
    fn generated_struct_reads_defaults_and_writes_through() {
        let gateway = MemoryGateway::new();
        let settings = TestSettings::new(gateway.clone());
        assert_eq!(TestSettings::<MemoryGateway>::NAMESPACE, "test-settings");

        assert_eq!(settings.get_theme(), Theme::Light);
        assert_eq!(settings.get_launches(), 0);
        assert_eq!(settings.get_greeting(), "hello");
        assert!(!settings.has_greeting());

        settings.set_theme(Theme::Dark);
        block_on(settings.set_launches_sync(3)).unwrap();
        settings.set_greeting("hi".to_owned());

        assert_eq!(gateway.value("theme"), Some(Value::String("dark".to_owned())));
        assert_eq!(gateway.value("launches"), Some(Value::Integer(3)));
        assert_eq!(settings.get_theme(), Theme::Dark);
        assert!(settings.has_greeting());
        assert!(settings.has("launches"));

        settings.remove_greeting();
        assert_eq!(settings.get_greeting(), "hello");

        settings.reset();
        assert!(gateway.is_empty());
        assert_eq!(settings.get_launches(), 0);
    }

    #[test]
    fn adapted_values_are_observable() {
        let settings = TestSettings::new(Arc::new(MemoryGateway::new()));
        let mut themes = block_on_stream(settings.observe_theme());
        assert_eq!(themes.next(), Some(Theme::Light));

        settings.set_theme(Theme::Dark);
        assert_eq!(themes.next(), Some(Theme::Dark));
    }

    #[test]
    fn unparseable_values_read_as_the_default() {
        let gateway = MemoryGateway::new();
        gateway.put_string("theme", "sepia");
        let settings = TestSettings::new(&gateway);
        assert_eq!(settings.get_theme(), Theme::Light);
    }
}
