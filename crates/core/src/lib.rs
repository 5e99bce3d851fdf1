//! `switchboard-core`: values, conversion and parameter binding.
//!
//! This crate has no notion of commands or access control; it provides the
//! building blocks the dispatcher composes:
//!
//! - [`Value`] / [`ValueType`]: untyped input and declared target types
//! - [`ConversionService`]: explicit conversion table with a structural fallback
//! - [`ParameterSource`]: where raw parameter values come from
//! - [`Bindable`] / [`ParameterBinder`]: declared schemas and binding
//! - [`Context`] / [`Identity`]: per-dispatch state

pub mod binder;
pub mod context;
pub mod convert;
pub mod error;
pub mod identity;
pub mod param;
pub mod schema;
pub mod source;
pub mod value;

pub use binder::ParameterBinder;
pub use context::{Context, ContextError, Credentials};
pub use convert::{ConversionService, ConversionServiceBuilder, ElementwiseMapper, StructuralMapper};
pub use error::{BindingError, ConfigurationError, ConversionError, FieldError};
pub use identity::{Authority, Identity};
pub use param::Param;
pub use schema::{Bindable, ParameterDecl, ParameterSchema, SchemaBuilder, SchemaCache};
pub use source::{NoParameters, OwnedPrototype, ParameterSource, PrototypeSource};
pub use value::{Value, ValueKind, ValueType};
