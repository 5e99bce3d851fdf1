//! Rust field types that can be declared as command parameters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ConversionError;
use crate::value::{Value, ValueType};

/// A parameter field type.
///
/// `from_value` receives a value that the conversion service has already
/// brought to `value_type()`; it only unpacks, it never coerces.
pub trait Param: Sized {
    fn value_type() -> ValueType;

    fn from_value(value: Value) -> Result<Self, ConversionError>;

    fn to_value(&self) -> Value;
}

macro_rules! scalar_param {
    ($t:ty, $variant:ident) => {
        impl Param for $t {
            fn value_type() -> ValueType {
                ValueType::$variant
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(ConversionError::mismatch(other.kind(), ValueType::$variant)),
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(Clone::clone(self))
            }
        }
    };
}

scalar_param!(bool, Bool);
scalar_param!(i16, Short);
scalar_param!(i32, Int);
scalar_param!(i64, Long);
scalar_param!(f64, Double);
scalar_param!(Decimal, Decimal);
scalar_param!(String, String);
scalar_param!(DateTime<Utc>, Date);
scalar_param!(Uuid, Uuid);

impl Param for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: Param> Param for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map(T::to_value).unwrap_or(Value::Null)
    }
}

impl<T: Param> Param for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list_of(T::value_type())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ConversionError::mismatch(other.kind(), Self::value_type())),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(T::to_value).collect())
    }
}

impl<T: Param> Param for BTreeMap<String, T> {
    fn value_type() -> ValueType {
        ValueType::map_of(T::value_type())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(ConversionError::mismatch(other.kind(), Self::value_type())),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

/// Materialise a record type from its map form.
pub fn from_record<T: DeserializeOwned>(value: Value, name: &'static str) -> Result<T, ConversionError> {
    let kind = value.kind();
    serde_json::from_value(value.into_json())
        .map_err(|e| ConversionError::mapping(kind, ValueType::Record(name), e.to_string()))
}

/// Flatten a record type into its map form.
pub fn to_record<T: Serialize>(record: &T, name: &'static str) -> Value {
    Value::from_serialize(record).unwrap_or_else(|e| {
        tracing::warn!(record = name, error = %e, "record could not be serialized");
        Value::Null
    })
}

/// Implement [`Param`] for a serde record type.
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// struct Address { street: String, zip: String }
///
/// switchboard_core::record_param!(Address);
/// ```
#[macro_export]
macro_rules! record_param {
    ($t:ty) => {
        $crate::record_param!($t, stringify!($t));
    };
    ($t:ty, $name:expr) => {
        impl $crate::Param for $t {
            fn value_type() -> $crate::ValueType {
                $crate::ValueType::Record($name)
            }

            fn from_value(value: $crate::Value) -> ::core::result::Result<Self, $crate::ConversionError> {
                $crate::param::from_record(value, $name)
            }

            fn to_value(&self) -> $crate::Value {
                $crate::param::to_record(self, $name)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Address {
        street: String,
        zip: i32,
    }

    crate::record_param!(Address);

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::Int(3)).unwrap(), Some(3));
        assert_eq!(Option::<i32>::value_type(), ValueType::Int);
    }

    #[test]
    fn typed_extraction_does_not_coerce() {
        let err = i32::from_value(Value::Long(3)).unwrap_err();
        assert!(matches!(err, ConversionError::Invalid { .. }));
    }

    #[test]
    fn records_bind_from_maps() {
        let mut map = BTreeMap::new();
        map.insert("street".to_string(), Value::from("Main St"));
        map.insert("zip".to_string(), Value::Long(12345));

        let address = Address::from_value(Value::Map(map)).unwrap();
        assert_eq!(address.street, "Main St");
        assert_eq!(address.zip, 12345);
        assert_eq!(Address::value_type(), ValueType::Record("Address"));
    }

    #[test]
    fn malformed_record_is_a_mapping_error() {
        let mut map = BTreeMap::new();
        map.insert("street".to_string(), Value::Long(1));

        let err = Address::from_value(Value::Map(map)).unwrap_err();
        assert!(matches!(err, ConversionError::Mapping { .. }));
    }
}
