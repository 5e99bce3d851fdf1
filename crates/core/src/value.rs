//! Dynamic values exchanged between transports, converters and commands.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};
use uuid::Uuid;

/// An untyped parameter or result value.
///
/// Dates carry millisecond precision when they travel as epoch longs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// Runtime discriminant of a [`Value`]; the key of the conversion table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Bool,
    Short,
    Int,
    Long,
    Double,
    Decimal,
    String,
    Date,
    Uuid,
    List,
    Map,
}

impl ValueKind {
    /// Numeric kinds, narrowest first.
    pub const NUMERIC: [ValueKind; 5] = [
        ValueKind::Short,
        ValueKind::Int,
        ValueKind::Long,
        ValueKind::Double,
        ValueKind::Decimal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Bool",
            ValueKind::Short => "Short",
            ValueKind::Int => "Int",
            ValueKind::Long => "Long",
            ValueKind::Double => "Double",
            ValueKind::Decimal => "Decimal",
            ValueKind::String => "String",
            ValueKind::Date => "Date",
            ValueKind::Uuid => "Uuid",
            ValueKind::List => "List",
            ValueKind::Map => "Map",
        }
    }

    pub fn is_numeric(self) -> bool {
        Self::NUMERIC.contains(&self)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared target type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Short,
    Int,
    Long,
    Double,
    Decimal,
    String,
    Date,
    Uuid,
    List(Box<ValueType>),
    /// String-keyed map with homogeneous values.
    Map(Box<ValueType>),
    /// A named structured type, carried as a map and materialised with serde.
    Record(&'static str),
    Any,
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn map_of(element: ValueType) -> Self {
        ValueType::Map(Box::new(element))
    }

    /// The table key for scalar targets; composite targets have none.
    pub fn scalar_kind(&self) -> Option<ValueKind> {
        match self {
            ValueType::Bool => Some(ValueKind::Bool),
            ValueType::Short => Some(ValueKind::Short),
            ValueType::Int => Some(ValueKind::Int),
            ValueType::Long => Some(ValueKind::Long),
            ValueType::Double => Some(ValueKind::Double),
            ValueType::Decimal => Some(ValueKind::Decimal),
            ValueType::String => Some(ValueKind::String),
            ValueType::Date => Some(ValueKind::Date),
            ValueType::Uuid => Some(ValueKind::Uuid),
            ValueType::List(_) | ValueType::Map(_) | ValueType::Record(_) | ValueType::Any => None,
        }
    }

    pub fn of_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => ValueType::Bool,
            ValueKind::Short => ValueType::Short,
            ValueKind::Int => ValueType::Int,
            ValueKind::Long => ValueType::Long,
            ValueKind::Double => ValueType::Double,
            ValueKind::Decimal => ValueType::Decimal,
            ValueKind::String => ValueType::String,
            ValueKind::Date => ValueType::Date,
            ValueKind::Uuid => ValueType::Uuid,
            ValueKind::List => ValueType::list_of(ValueType::Any),
            ValueKind::Map => ValueType::map_of(ValueType::Any),
            ValueKind::Null => ValueType::Any,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::List(element) => write!(f, "List<{element}>"),
            ValueType::Map(element) => write!(f, "Map<String, {element}>"),
            ValueType::Record(name) => write!(f, "Record({name})"),
            ValueType::Any => f.write_str("Any"),
            scalar => match scalar.scalar_kind() {
                Some(kind) => f.write_str(kind.name()),
                None => f.write_str("?"),
            },
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Short(_) => ValueKind::Short,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value can be handed to `target` as-is.
    ///
    /// Containers satisfy their declared type when every non-null element
    /// does; any map satisfies a record type structurally.
    pub fn satisfies(&self, target: &ValueType) -> bool {
        match (self, target) {
            (_, ValueType::Any) => true,
            (Value::List(items), ValueType::List(element)) => {
                items.iter().all(|v| v.is_null() || v.satisfies(element))
            }
            (Value::Map(entries), ValueType::Map(element)) => {
                entries.values().all(|v| v.is_null() || v.satisfies(element))
            }
            (Value::Map(_), ValueType::Record(_)) => true,
            (value, target) => target.scalar_kind() == Some(value.kind()),
        }
    }

    /// Date at `millis` since the Unix epoch, if representable.
    pub fn date_from_millis(millis: i64) -> Option<Value> {
        Utc.timestamp_millis_opt(millis).single().map(Value::Date)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert any serde-serializable value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Render as JSON. Decimals, dates and uuids become strings; non-finite
    /// doubles become `null`.
    pub fn into_json(self) -> JsonValue {
        JsonValue::from(self)
    }
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Long(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Decimal(Decimal::from(u))
                } else {
                    n.as_f64().map(Value::Double).unwrap_or(Value::Null)
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Short(v) => JsonValue::Number(Number::from(v)),
            Value::Int(v) => JsonValue::Number(Number::from(v)),
            Value::Long(v) => JsonValue::Number(Number::from(v)),
            Value::Double(v) => Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::String(s) => JsonValue::String(s),
            Value::Date(d) => JsonValue::String(format_date(&d)),
            Value::Uuid(u) => JsonValue::String(u.to_string()),
            Value::List(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_scalar {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_from_scalar!(bool, Bool);
impl_from_scalar!(i16, Short);
impl_from_scalar!(i32, Int);
impl_from_scalar!(i64, Long);
impl_from_scalar!(f64, Double);
impl_from_scalar!(Decimal, Decimal);
impl_from_scalar!(String, String);
impl_from_scalar!(DateTime<Utc>, Date);
impl_from_scalar!(Uuid, Uuid);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}
