//! Statically declared parameter schemas.
//!
//! A command type declares its parameters once through [`Bindable::declare`];
//! the resulting [`ParameterSchema`] drives binding and documentation and is
//! cached per type for the life of the process.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::error::ConversionError;
use crate::param::Param;
use crate::value::{Value, ValueType};

/// A type whose parameters can be bound from a [`ParameterSource`].
///
/// Usually implemented with the [`bindable!`](crate::bindable) macro.
/// Implementations must keep `declare`, `assign` and `read` in agreement:
/// every declared name is assignable and readable.
///
/// [`ParameterSource`]: crate::ParameterSource
pub trait Bindable: Send + 'static {
    /// Declare parameters in order. Base declarations come first.
    fn declare(schema: &mut SchemaBuilder);

    /// Store an already converted value into the named field.
    fn assign(&mut self, name: &str, value: Value) -> Result<(), ConversionError>;

    /// Current value of the named field, by value.
    fn read(&self, name: &str) -> Option<Value>;
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDecl {
    name: &'static str,
    #[serde(rename = "type", serialize_with = "serialize_type")]
    ty: ValueType,
    required: bool,
}

fn serialize_type<S: serde::Serializer>(ty: &ValueType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(ty)
}

impl ParameterDecl {
    pub fn new(name: &'static str, ty: ValueType, required: bool) -> Self {
        Self { name, ty, required }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// The ordered parameter declarations of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSchema {
    owner: &'static str,
    params: Vec<ParameterDecl>,
}

impl ParameterSchema {
    pub fn of<B: Bindable>() -> Self {
        let mut builder = SchemaBuilder::new(std::any::type_name::<B>());
        B::declare(&mut builder);
        builder.build()
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn params(&self) -> &[ParameterDecl] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDecl> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &ParameterDecl> {
        self.params.iter().filter(|p| p.required)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Collects declarations for [`ParameterSchema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    owner: &'static str,
    params: Vec<ParameterDecl>,
}

impl SchemaBuilder {
    fn new(owner: &'static str) -> Self {
        Self {
            owner,
            params: Vec::new(),
        }
    }

    /// Declare a parameter of type `T`.
    ///
    /// Redeclaring a name replaces the earlier declaration and moves it to the
    /// end, so a derived type can tighten a base parameter.
    pub fn declare<T: Param>(&mut self, name: &'static str, required: bool) -> &mut Self {
        self.params.retain(|p| p.name != name);
        self.params.push(ParameterDecl::new(name, T::value_type(), required));
        self
    }

    pub fn required<T: Param>(&mut self, name: &'static str) -> &mut Self {
        self.declare::<T>(name, true)
    }

    pub fn optional<T: Param>(&mut self, name: &'static str) -> &mut Self {
        self.declare::<T>(name, false)
    }

    /// Pull in every declaration of a base type.
    pub fn include<B: Bindable>(&mut self) -> &mut Self {
        B::declare(self);
        self
    }

    fn build(self) -> ParameterSchema {
        ParameterSchema {
            owner: self.owner,
            params: self.params,
        }
    }
}

/// Process-wide cache of schemas keyed by type identity.
///
/// The first caller for a type computes the schema under the write lock;
/// concurrent callers either wait and receive the same `Arc`, or find it
/// already present.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<TypeId, Arc<ParameterSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<B: Bindable>(&self) -> Arc<ParameterSchema> {
        let key = TypeId::of::<B>();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(schema);
        }

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(schemas.entry(key).or_insert_with(|| {
            let schema = ParameterSchema::of::<B>();
            debug!(owner = schema.owner(), params = schema.len(), "parameter schema cached");
            Arc::new(schema)
        }))
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Implement [`Bindable`] from a field list.
///
/// Each field is `required` or `optional`; optional fields keep their current
/// value when the source has nothing for them. Fields not listed are not
/// parameters. The `extends` form declares the base type's parameters first
/// and delegates unknown names to the base field.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Paging { page: i32, size: i32 }
/// bindable!(Paging { optional page: i32, optional size: i32 });
///
/// #[derive(Debug, Default)]
/// struct ListUsers { paging: Paging, role: Option<String> }
/// bindable!(ListUsers extends paging: Paging { optional role: Option<String> });
/// ```
#[macro_export]
macro_rules! bindable {
    (@required required) => { true };
    (@required optional) => { false };

    ($ty:ident { $($mode:ident $field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Bindable for $ty {
            #[allow(unused_variables)]
            fn declare(schema: &mut $crate::SchemaBuilder) {
                $( schema.declare::<$fty>(stringify!($field), $crate::bindable!(@required $mode)); )*
            }

            #[allow(unused_variables)]
            fn assign(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> ::core::result::Result<(), $crate::ConversionError> {
                match name {
                    $( stringify!($field) => {
                        self.$field = <$fty as $crate::Param>::from_value(value)?;
                        Ok(())
                    } )*
                    _ => Err($crate::ConversionError::unknown_parameter(name)),
                }
            }

            fn read(&self, name: &str) -> ::core::option::Option<$crate::Value> {
                match name {
                    $( stringify!($field) => Some($crate::Param::to_value(&self.$field)), )*
                    _ => None,
                }
            }
        }
    };

    ($ty:ident extends $base:ident : $bty:ty { $($mode:ident $field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Bindable for $ty {
            fn declare(schema: &mut $crate::SchemaBuilder) {
                schema.include::<$bty>();
                $( schema.declare::<$fty>(stringify!($field), $crate::bindable!(@required $mode)); )*
            }

            fn assign(
                &mut self,
                name: &str,
                value: $crate::Value,
            ) -> ::core::result::Result<(), $crate::ConversionError> {
                match name {
                    $( stringify!($field) => {
                        self.$field = <$fty as $crate::Param>::from_value(value)?;
                        Ok(())
                    } )*
                    _ => $crate::Bindable::assign(&mut self.$base, name, value),
                }
            }

            fn read(&self, name: &str) -> ::core::option::Option<$crate::Value> {
                match name {
                    $( stringify!($field) => Some($crate::Param::to_value(&self.$field)), )*
                    _ => $crate::Bindable::read(&self.$base, name),
                }
            }
        }
    };
}
