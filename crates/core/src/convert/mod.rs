//! Type conversion service.
//!
//! Resolution order for `convert(value, target)`:
//!
//! 1. `Null` stays `Null`.
//! 2. A value that already satisfies `target` is returned unchanged.
//! 3. An explicit converter for `(value kind, target kind)` runs.
//! 4. Otherwise the structural mapper runs, unless the pair is listed in
//!    [`UNSUPPORTED`].
//!
//! The merged table is built once and is read-only afterwards, so a service
//! can be shared across threads behind an `Arc` without locking.

mod builtin;
mod mapper;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{ConfigurationError, ConversionError};
use crate::param::Param;
use crate::value::{Value, ValueKind, ValueType};

pub use builtin::{UNSUPPORTED, is_unsupported};
pub use mapper::{ElementwiseMapper, StructuralMapper};

/// A single conversion function.
pub type Converter = Arc<dyn Fn(Value) -> Result<Value, ConversionError> + Send + Sync>;

type ConversionTable = HashMap<ValueKind, HashMap<ValueKind, Converter>>;

pub struct ConversionService {
    table: ConversionTable,
    mapper: Arc<dyn StructuralMapper>,
}

impl ConversionService {
    /// Built-in conversions with the element-wise structural fallback.
    pub fn new() -> Self {
        Self {
            table: builtin::table(),
            mapper: Arc::new(ElementwiseMapper),
        }
    }

    pub fn builder() -> ConversionServiceBuilder {
        ConversionServiceBuilder::default()
    }

    pub fn converter(&self, from: ValueKind, to: ValueKind) -> Option<&Converter> {
        self.table.get(&from).and_then(|targets| targets.get(&to))
    }

    /// All `(from, to)` pairs with an explicit converter.
    pub fn registered_pairs(&self) -> Vec<(ValueKind, ValueKind)> {
        let mut pairs: Vec<_> = self
            .table
            .iter()
            .flat_map(|(from, targets)| targets.keys().map(move |to| (*from, *to)))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn convert(&self, value: Value, target: &ValueType) -> Result<Value, ConversionError> {
        if value.is_null() || value.satisfies(target) {
            return Ok(value);
        }

        let from = value.kind();
        if let Some(to) = target.scalar_kind() {
            if let Some(converter) = self.converter(from, to) {
                return converter(value);
            }
            if is_unsupported(from, to) {
                return Err(ConversionError::unsupported(from, target.clone()));
            }
        }

        self.mapper
            .map(value, target, self)
            .map_err(|e| ConversionError::mapping(from, target.clone(), format!("{e:#}")))
    }

    /// Convert straight into a Rust parameter type. `Null` yields `None`.
    pub fn convert_to<T: Param>(&self, value: Value) -> Result<Option<T>, ConversionError> {
        if value.is_null() {
            return Ok(None);
        }
        let converted = self.convert(value, &T::value_type())?;
        T::from_value(converted).map(Some)
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionService")
            .field("pairs", &self.registered_pairs().len())
            .finish_non_exhaustive()
    }
}

/// Merges user conversions over the built-in table.
#[derive(Default)]
pub struct ConversionServiceBuilder {
    overrides: Vec<(ValueKind, ValueKind, Converter)>,
    mapper: Option<Arc<dyn StructuralMapper>>,
}

impl ConversionServiceBuilder {
    /// Register a converter; it replaces any built-in for the same pair.
    pub fn register<F>(mut self, from: ValueKind, to: ValueKind, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.overrides.push((from, to, Arc::new(converter)));
        self
    }

    pub fn mapper(mut self, mapper: impl StructuralMapper + 'static) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn build(self) -> Result<ConversionService, ConfigurationError> {
        let mut table = builtin::table();
        for (from, to, converter) in self.overrides {
            if is_unsupported(from, to) {
                return Err(ConfigurationError::new(format!(
                    "conversion from {from} to {to} is disabled and cannot be registered"
                )));
            }
            table.entry(from).or_default().insert(to, converter);
        }

        let service = ConversionService {
            table,
            mapper: self.mapper.unwrap_or_else(|| Arc::new(ElementwiseMapper)),
        };
        debug!(pairs = service.registered_pairs().len(), "conversion table built");
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    fn sample(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Bool => Value::Bool(true),
            ValueKind::Short => Value::Short(42),
            ValueKind::Int => Value::Int(42),
            ValueKind::Long => Value::Long(42),
            ValueKind::Double => Value::Double(42.0),
            ValueKind::Decimal => Value::Decimal(Decimal::from(42)),
            ValueKind::Date => Value::date_from_millis(42).unwrap(),
            ValueKind::Uuid => Value::Uuid(uuid::Uuid::nil()),
            _ => Value::Null,
        }
    }

    fn sample_for(from: ValueKind, to: ValueKind) -> Value {
        match (from, to) {
            (ValueKind::String, ValueKind::Bool) => Value::from("true"),
            (ValueKind::String, ValueKind::Uuid) => Value::from(uuid::Uuid::nil().to_string()),
            (ValueKind::String, _) => Value::from("42"),
            (from, _) => sample(from),
        }
    }

    #[test]
    fn date_and_long_convert_both_ways() {
        let svc = ConversionService::new();
        let date = Value::date_from_millis(42).unwrap();

        assert_eq!(svc.convert(date.clone(), &ValueType::Long).unwrap(), Value::Long(42));
        assert_eq!(svc.convert(Value::Long(42), &ValueType::Date).unwrap(), date);
    }

    #[test]
    fn ambiguous_epochs_do_not_become_dates() {
        let svc = ConversionService::new();

        let err = svc.convert(Value::Int(42), &ValueType::Date).unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));

        let err = svc.convert(Value::from("42"), &ValueType::Date).unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));

        let err = svc
            .convert(Value::date_from_millis(42).unwrap(), &ValueType::Int)
            .unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));
    }

    #[test]
    fn every_registered_pair_converts_a_sample() {
        let svc = ConversionService::new();
        for (from, to) in svc.registered_pairs() {
            assert!(!is_unsupported(from, to));
            let converted = svc
                .convert(sample_for(from, to), &ValueType::of_kind(to))
                .unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
            assert_eq!(converted.kind(), to);
        }
    }

    #[test]
    fn null_is_a_no_op() {
        let svc = ConversionService::new();
        assert_eq!(svc.convert(Value::Null, &ValueType::Int).unwrap(), Value::Null);
        assert_eq!(svc.convert_to::<i32>(Value::Null).unwrap(), None);
    }

    #[test]
    fn user_conversions_take_precedence() {
        let svc = ConversionService::builder()
            .register(ValueKind::String, ValueKind::Bool, |v| {
                Ok(Value::Bool(v.as_str() == Some("yes")))
            })
            .build()
            .unwrap();

        assert_eq!(
            svc.convert(Value::from("yes"), &ValueType::Bool).unwrap(),
            Value::Bool(true)
        );
        // Untouched built-ins survive the merge.
        assert_eq!(svc.convert(Value::Long(7), &ValueType::Int).unwrap(), Value::Int(7));
    }

    #[test]
    fn disabled_pairs_cannot_be_registered() {
        let err = ConversionService::builder()
            .register(ValueKind::Int, ValueKind::Date, |v| Ok(v))
            .build()
            .unwrap_err();
        assert!(err.message().contains("disabled"));
    }

    #[test]
    fn lists_convert_element_wise() {
        let svc = ConversionService::new();
        let converted = svc
            .convert(
                Value::List(vec![Value::from("1"), Value::Long(2)]),
                &ValueType::list_of(ValueType::Int),
            )
            .unwrap();
        assert_eq!(converted, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn mapper_failures_surface_as_conversion_errors() {
        let svc = ConversionService::new();
        let err = svc
            .convert(
                Value::List(vec![Value::Long(1), Value::from("x")]),
                &ValueType::list_of(ValueType::Int),
            )
            .unwrap_err();
        match err {
            ConversionError::Mapping { reason, .. } => assert!(reason.contains("element 1")),
            other => panic!("expected mapping error, got {other:?}"),
        }

        let err = svc
            .convert(Value::Long(1), &ValueType::Record("Address"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Mapping { .. }));
    }

    #[test]
    fn custom_mapper_is_used_for_uncovered_targets() {
        let svc = ConversionService::builder()
            .mapper(|value: Value, _: &ValueType, _: &ConversionService| {
                let mut map = BTreeMap::new();
                map.insert("value".to_string(), value);
                Ok::<_, anyhow::Error>(Value::Map(map))
            })
            .build()
            .unwrap();

        let out = svc.convert(Value::Long(3), &ValueType::Record("Boxed")).unwrap();
        assert_eq!(out.as_map().unwrap()["value"], Value::Long(3));
    }

    #[test]
    fn typed_conversion_lands_in_rust_types() {
        let svc = ConversionService::new();
        let when: Option<chrono::DateTime<Utc>> = svc.convert_to(Value::Long(1_000)).unwrap();
        assert_eq!(when.unwrap().timestamp_millis(), 1_000);

        let ids: Option<Vec<i16>> = svc
            .convert_to(Value::List(vec![Value::from("3"), Value::Double(4.0)]))
            .unwrap();
        assert_eq!(ids.unwrap(), vec![3, 4]);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i16>().prop_map(Value::Short),
            any::<i32>().prop_map(Value::Int),
            any::<i64>().prop_map(Value::Long),
            (-1e12f64..1e12f64).prop_map(Value::Double),
            any::<i64>().prop_map(|n| Value::Decimal(Decimal::new(n, 2))),
            "[a-z0-9 ]{0,12}".prop_map(Value::String),
            (-1_000_000_000_000i64..1_000_000_000_000i64)
                .prop_map(|ms| Value::date_from_millis(ms).unwrap()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Converting a value to its own type returns it untouched.
        #[test]
        fn converting_to_own_type_is_identity(value in scalar()) {
            let svc = ConversionService::new();
            let target = ValueType::of_kind(value.kind());
            let once = svc.convert(value.clone(), &target).unwrap();
            prop_assert_eq!(&once, &value);
            let twice = svc.convert(once, &target).unwrap();
            prop_assert_eq!(twice, value);
        }

        /// Widening an int never loses information.
        #[test]
        fn widening_round_trips(n in any::<i32>()) {
            let svc = ConversionService::new();
            let long = svc.convert(Value::Int(n), &ValueType::Long).unwrap();
            let decimal = svc.convert(long.clone(), &ValueType::Decimal).unwrap();
            let back = svc.convert(decimal, &ValueType::Int).unwrap();
            prop_assert_eq!(long, Value::Long(i64::from(n)));
            prop_assert_eq!(back, Value::Int(n));
        }

        /// Narrowing either succeeds exactly or fails; it never wraps.
        #[test]
        fn narrowing_never_wraps(n in any::<i64>()) {
            let svc = ConversionService::new();
            match svc.convert(Value::Long(n), &ValueType::Int) {
                Ok(Value::Int(v)) => prop_assert_eq!(i64::from(v), n),
                Ok(other) => prop_assert!(false, "unexpected {:?}", other),
                Err(_) => prop_assert!(i32::try_from(n).is_err()),
            }
        }
    }
}
