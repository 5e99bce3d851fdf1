//! Structural fallback used when the table has no explicit converter.

use anyhow::{Context as _, bail};

use crate::value::{Value, ValueType};

use super::ConversionService;

/// Environment-supplied fallback for targets the table does not cover.
///
/// Failures may use any error type; the conversion service wraps them into
/// `ConversionError::Mapping`.
pub trait StructuralMapper: Send + Sync {
    fn map(&self, value: Value, target: &ValueType, conversions: &ConversionService) -> anyhow::Result<Value>;
}

impl<F> StructuralMapper for F
where
    F: Fn(Value, &ValueType, &ConversionService) -> anyhow::Result<Value> + Send + Sync,
{
    fn map(&self, value: Value, target: &ValueType, conversions: &ConversionService) -> anyhow::Result<Value> {
        self(value, target, conversions)
    }
}

/// Default mapper: converts list elements and map values one by one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementwiseMapper;

impl StructuralMapper for ElementwiseMapper {
    fn map(&self, value: Value, target: &ValueType, conversions: &ConversionService) -> anyhow::Result<Value> {
        match (value, target) {
            (Value::List(items), ValueType::List(element)) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    conversions
                        .convert(item, element)
                        .with_context(|| format!("element {idx}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()
                .map(Value::List),
            (Value::Map(entries), ValueType::Map(element)) => entries
                .into_iter()
                .map(|(key, item)| {
                    conversions
                        .convert(item, element)
                        .with_context(|| format!("key '{key}'"))
                        .map(|v| (key, v))
                })
                .collect::<anyhow::Result<_>>()
                .map(Value::Map),
            (value, target) => bail!("no structural mapping from {} to {target}", value.kind()),
        }
    }
}
