//! Built-in conversion table.
//!
//! Numeric narrowing is range-checked and refuses fractional values; nothing
//! here truncates silently. Dates only travel as epoch milliseconds through
//! `Long`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

use crate::error::ConversionError;
use crate::value::{Value, ValueKind, ValueType, format_date};

use super::{ConversionTable, Converter};

/// Pairs that must never convert, even if a converter is registered for them.
///
/// Integral or textual epochs are ambiguous (seconds or millis? which zone?)
/// and narrowing a date to 32 bits overflows in 2038. The only date paths are
/// `Date -> Long` and `Long -> Date`, both in epoch milliseconds.
pub const UNSUPPORTED: &[(ValueKind, ValueKind)] = &[
    (ValueKind::Short, ValueKind::Date),
    (ValueKind::Int, ValueKind::Date),
    (ValueKind::Double, ValueKind::Date),
    (ValueKind::Decimal, ValueKind::Date),
    (ValueKind::String, ValueKind::Date),
    (ValueKind::Date, ValueKind::Short),
    (ValueKind::Date, ValueKind::Int),
    (ValueKind::Date, ValueKind::Double),
    (ValueKind::Date, ValueKind::Decimal),
];

pub fn is_unsupported(from: ValueKind, to: ValueKind) -> bool {
    UNSUPPORTED.contains(&(from, to))
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

pub(super) fn table() -> ConversionTable {
    let mut table: ConversionTable = HashMap::new();

    for from in ValueKind::NUMERIC.into_iter().chain([ValueKind::String]) {
        insert(&mut table, from, ValueKind::Short, to_short);
        insert(&mut table, from, ValueKind::Int, to_int);
        insert(&mut table, from, ValueKind::Long, to_long);
        insert(&mut table, from, ValueKind::Double, to_double);
        insert(&mut table, from, ValueKind::Decimal, to_decimal);
    }

    for from in [
        ValueKind::Bool,
        ValueKind::Short,
        ValueKind::Int,
        ValueKind::Long,
        ValueKind::Double,
        ValueKind::Decimal,
        ValueKind::Date,
        ValueKind::Uuid,
    ] {
        insert(&mut table, from, ValueKind::String, to_string);
    }

    insert(&mut table, ValueKind::String, ValueKind::Bool, to_bool);
    insert(&mut table, ValueKind::String, ValueKind::Uuid, to_uuid);
    insert(&mut table, ValueKind::Date, ValueKind::Long, to_long);
    insert(&mut table, ValueKind::Long, ValueKind::Date, to_date);

    table
}

fn insert(
    table: &mut ConversionTable,
    from: ValueKind,
    to: ValueKind,
    f: fn(Value) -> Result<Value, ConversionError>,
) {
    if from == to {
        return;
    }
    let converter: Converter = Arc::new(f);
    table.entry(from).or_default().insert(to, converter);
}

fn integral(value: &Value) -> Result<i64, String> {
    match value {
        Value::Short(v) => Ok(i64::from(*v)),
        Value::Int(v) => Ok(i64::from(*v)),
        Value::Long(v) => Ok(*v),
        Value::Date(d) => Ok(d.timestamp_millis()),
        Value::Double(v) => {
            if !v.is_finite() || v.fract() != 0.0 {
                Err(format!("{v} is not an integral value"))
            } else if *v < -TWO_POW_63 || *v >= TWO_POW_63 {
                Err(format!("{v} is out of range"))
            } else {
                Ok(*v as i64)
            }
        }
        Value::Decimal(d) => {
            if !d.fract().is_zero() {
                return Err(format!("{d} is not an integral value"));
            }
            d.to_i64().ok_or_else(|| format!("{d} is out of range"))
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("'{s}' is not an integer: {e}")),
        other => Err(format!("{} is not numeric", other.kind())),
    }
}

fn narrow<T: TryFrom<i64>>(value: Value, target: ValueType, wrap: fn(T) -> Value) -> Result<Value, ConversionError> {
    let from = value.kind();
    integral(&value)
        .and_then(|n| T::try_from(n).map_err(|_| format!("{n} is out of range")))
        .map(wrap)
        .map_err(|reason| ConversionError::invalid(from, target, reason))
}

fn to_short(value: Value) -> Result<Value, ConversionError> {
    narrow::<i16>(value, ValueType::Short, Value::Short)
}

fn to_int(value: Value) -> Result<Value, ConversionError> {
    narrow::<i32>(value, ValueType::Int, Value::Int)
}

fn to_long(value: Value) -> Result<Value, ConversionError> {
    narrow::<i64>(value, ValueType::Long, Value::Long)
}

fn to_double(value: Value) -> Result<Value, ConversionError> {
    let from = value.kind();
    let invalid = |reason: String| ConversionError::invalid(from, ValueType::Double, reason);
    match value {
        Value::Short(v) => Ok(Value::Double(f64::from(v))),
        Value::Int(v) => Ok(Value::Double(f64::from(v))),
        Value::Long(v) => Ok(Value::Double(v as f64)),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Double)
            .ok_or_else(|| invalid(format!("{d} is out of range"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| invalid(format!("'{s}' is not a number: {e}"))),
        other => Err(ConversionError::unsupported(other.kind(), ValueType::Double)),
    }
}

fn to_decimal(value: Value) -> Result<Value, ConversionError> {
    let from = value.kind();
    let invalid = |reason: String| ConversionError::invalid(from, ValueType::Decimal, reason);
    match value {
        Value::Short(v) => Ok(Value::Decimal(Decimal::from(v))),
        Value::Int(v) => Ok(Value::Decimal(Decimal::from(v))),
        Value::Long(v) => Ok(Value::Decimal(Decimal::from(v))),
        Value::Double(v) => Decimal::from_f64(v)
            .map(Value::Decimal)
            .ok_or_else(|| invalid(format!("{v} is not representable"))),
        Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|e| invalid(format!("'{s}' is not a decimal: {e}"))),
        other => Err(ConversionError::unsupported(other.kind(), ValueType::Decimal)),
    }
}

fn to_string(value: Value) -> Result<Value, ConversionError> {
    let rendered = match value {
        Value::Bool(v) => v.to_string(),
        Value::Short(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Date(d) => format_date(&d),
        Value::Uuid(u) => u.to_string(),
        Value::String(s) => s,
        other => return Err(ConversionError::unsupported(other.kind(), ValueType::String)),
    };
    Ok(Value::String(rendered))
}

fn to_bool(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(ConversionError::invalid(
            other.kind(),
            ValueType::Bool,
            "expected 'true' or 'false'",
        )),
    }
}

fn to_uuid(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::String(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| ConversionError::invalid(ValueKind::String, ValueType::Uuid, e.to_string())),
        other => Err(ConversionError::unsupported(other.kind(), ValueType::Uuid)),
    }
}

fn to_date(value: Value) -> Result<Value, ConversionError> {
    match value {
        Value::Long(millis) => Value::date_from_millis(millis).ok_or_else(|| {
            ConversionError::invalid(
                ValueKind::Long,
                ValueType::Date,
                format!("{millis} is outside the representable date range"),
            )
        }),
        other => Err(ConversionError::unsupported(other.kind(), ValueType::Date)),
    }
}
