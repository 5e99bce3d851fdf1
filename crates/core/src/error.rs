//! Error model shared by conversion and binding.

use thiserror::Error;

use crate::value::{ValueKind, ValueType};

/// A value could not be converted to a declared type.
///
/// Every conversion path (explicit converter, structural fallback, typed
/// extraction) reports through this one type, so callers never see a
/// different taxonomy depending on which path ran.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    /// No converter exists for the pair, or the pair is explicitly disabled.
    #[error("no conversion from {from} to {to}")]
    Unsupported { from: ValueKind, to: ValueType },

    /// A converter exists but rejected this particular value.
    #[error("cannot convert {from} to {to}: {reason}")]
    Invalid {
        from: ValueKind,
        to: ValueType,
        reason: String,
    },

    /// The structural fallback mapper failed.
    #[error("cannot map {from} to {to}: {reason}")]
    Mapping {
        from: ValueKind,
        to: ValueType,
        reason: String,
    },

    /// A binding target was asked to assign a parameter it does not declare.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
}

impl ConversionError {
    pub fn unsupported(from: ValueKind, to: ValueType) -> Self {
        Self::Unsupported { from, to }
    }

    pub fn invalid(from: ValueKind, to: ValueType, reason: impl Into<String>) -> Self {
        Self::Invalid {
            from,
            to,
            reason: reason.into(),
        }
    }

    pub fn mapping(from: ValueKind, to: ValueType, reason: impl Into<String>) -> Self {
        Self::Mapping {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// The value handed to a typed extraction did not have the expected shape.
    pub fn mismatch(from: ValueKind, to: ValueType) -> Self {
        Self::invalid(from, to, "value has the wrong shape")
    }

    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter(name.into())
    }
}

/// Failure to bind one declared parameter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("missing required parameter '{field}'")]
    Missing { field: String },

    #[error("invalid parameter '{field}': {source}")]
    Invalid {
        field: String,
        source: ConversionError,
    },
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, source: ConversionError) -> Self {
        Self::Invalid {
            field: field.into(),
            source,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            FieldError::Missing { field } | FieldError::Invalid { field, .. } => field,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldError::Missing { .. })
    }
}

/// Binding a command failed on one or more fields.
///
/// Every declared field is attempted before this is raised; `failures` lists
/// each offending field in declaration order.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("cannot bind parameters of {command}: {}", summarize(.failures))]
pub struct BindingError {
    pub command: String,
    pub failures: Vec<FieldError>,
}

impl BindingError {
    pub fn new(command: impl Into<String>, failures: Vec<FieldError>) -> Self {
        Self {
            command: command.into(),
            failures,
        }
    }

    /// Re-label the error with the command's dispatch name.
    pub fn for_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// True when every failure is a missing required parameter.
    pub fn is_missing(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(FieldError::is_missing)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(FieldError::field)
    }
}

fn summarize(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A deployment mistake detected while building or first using a component.
///
/// These are fatal: they are raised eagerly and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("configuration error: {0}")]
pub struct ConfigurationError(String);

impl ConfigurationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
