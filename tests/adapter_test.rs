//! Custom value types stored through adapters.

use std::fmt;
use std::str::FromStr;

use typed_prefs::futures::executor::block_on_stream;
use typed_prefs::futures::StreamExt;
use typed_prefs::{
    preferences, Gateway, MemoryGateway, Observable, ParseAdapter, PreferenceAdapter, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    One,
    Two,
    Three,
}

/// Stores a [`Type`] as its ordinal.
pub struct TypeAdapter;

impl TypeAdapter {
    fn ordinal(value: Type) -> i32 {
        match value {
            Type::One => 0,
            Type::Two => 1,
            Type::Three => 2,
        }
    }

    fn from_ordinal(ordinal: i32, default: Type) -> Type {
        match ordinal {
            0 => Type::One,
            1 => Type::Two,
            2 => Type::Three,
            _ => default,
        }
    }
}

impl PreferenceAdapter<Type> for TypeAdapter {
    fn observe(key: &str, default: Type, gateway: &dyn Gateway) -> Observable<Type> {
        gateway
            .observe_integer(key, Self::ordinal(default))
            .map(move |ordinal| Self::from_ordinal(ordinal, default))
            .boxed()
    }

    fn get(key: &str, default: Type, gateway: &dyn Gateway) -> Type {
        Self::from_ordinal(gateway.get_integer(key, Self::ordinal(default)), default)
    }

    fn put(key: &str, value: Type, gateway: &dyn Gateway) {
        gateway.put_integer(key, Self::ordinal(value))
    }
}

#[preferences(name = "test")]
#[adapter(Type => TypeAdapter)]
pub trait EnumAdapterPreference {
    #[default(name = "enum")]
    const DEFAULT_ENUM: Type = Type::Three;

    #[get(name = "enum")]
    fn get_enum(&self) -> Type;

    #[observe(name = "enum")]
    fn observe_enum(&self) -> Observable<Type>;

    #[set(name = "enum")]
    fn set_enum(&self, value: Type);
}

#[test]
fn enum_round_trip() {
    let gateway = MemoryGateway::new();
    let prefs = EnumAdapterPreferenceImpl::new(gateway.clone());

    assert_eq!(prefs.get_enum(), Type::Three);
    prefs.set_enum(Type::One);
    assert_eq!(prefs.get_enum(), Type::One);
    assert_eq!(gateway.value("enum"), Some(Value::Integer(0)));
}

#[test]
fn enum_observable_follows_writes() {
    let prefs = EnumAdapterPreferenceImpl::new(MemoryGateway::new());
    let mut values = block_on_stream(prefs.observe_enum());
    assert_eq!(values.next(), Some(Type::Three));

    prefs.set_enum(Type::Two);
    assert_eq!(values.next(), Some(Type::Two));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Metric,
    Imperial,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        })
    }
}

impl FromStr for Unit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Unit::Metric),
            "imperial" => Ok(Unit::Imperial),
            _ => Err(()),
        }
    }
}

/// Always reads the unit it was built for. Used to prove which adapter a
/// method ends up calling.
pub struct ImperialOnly;

impl PreferenceAdapter<Unit> for ImperialOnly {
    fn observe(key: &str, _default: Unit, gateway: &dyn Gateway) -> Observable<Unit> {
        gateway.observe_string(key, "").map(|_| Unit::Imperial).boxed()
    }

    fn get(_key: &str, _default: Unit, _gateway: &dyn Gateway) -> Unit {
        Unit::Imperial
    }

    fn put(key: &str, _value: Unit, gateway: &dyn Gateway) {
        gateway.put_string(key, "imperial")
    }
}

#[preferences(name = "units")]
#[adapter(Unit => ParseAdapter)]
pub trait UnitPreferences {
    #[default]
    const DEFAULT_DISTANCE: Unit = Unit::Metric;
    #[default]
    const DEFAULT_WEIGHT: Unit = Unit::Metric;

    #[get]
    fn get_distance(&self) -> Unit;
    #[set]
    fn set_distance(&self, value: Unit);

    #[get]
    #[adapter(Unit => ImperialOnly)]
    fn get_weight(&self) -> Unit;
    #[set]
    fn set_weight(&self, value: Unit);
}

#[test]
fn method_adapter_takes_precedence() {
    let gateway = MemoryGateway::new();
    let prefs = UnitPreferencesImpl::new(gateway.clone());

    assert_eq!(prefs.get_distance(), Unit::Metric);
    assert_eq!(prefs.get_weight(), Unit::Imperial);

    prefs.set_weight(Unit::Metric);
    assert_eq!(gateway.value("weight"), Some(Value::String("metric".to_owned())));
    assert_eq!(prefs.get_weight(), Unit::Imperial);
}

#[test]
fn parse_adapter_stores_the_display_form() {
    let gateway = MemoryGateway::new();
    let prefs = UnitPreferencesImpl::new(gateway.clone());

    prefs.set_distance(Unit::Imperial);
    assert_eq!(gateway.value("distance"), Some(Value::String("imperial".to_owned())));
    assert_eq!(prefs.get_distance(), Unit::Imperial);

    gateway.put_string("distance", "furlongs");
    assert_eq!(prefs.get_distance(), Unit::Metric);
}
