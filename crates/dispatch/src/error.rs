use serde::{Deserialize, Serialize};
use thiserror::Error;

use switchboard_auth::{AccessDenied, AccessError};
use switchboard_core::{BindingError, ConfigurationError, ConversionError};

/// Everything that can stop a dispatch.
///
/// Framework-level rejections each have their own variant; failures raised
/// by a command's own logic are wrapped in [`DispatchError::Execution`] with
/// the original cause kept as the error source.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no such command: '{0}'")]
    NoSuchCommand(String),

    #[error("protocol version mismatch: expected '{expected}', got '{actual}'")]
    ProtocolMismatch { expected: String, actual: String },

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("command '{command}' failed")]
    Execution {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Wire-level error category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NoSuchCommand,
    ProtocolMismatch,
    MissingParameter,
    ConversionError,
    AccessDenied,
    ConfigurationError,
    ExecutionFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NoSuchCommand => "NoSuchCommand",
            ErrorKind::ProtocolMismatch => "ProtocolMismatch",
            ErrorKind::MissingParameter => "MissingParameter",
            ErrorKind::ConversionError => "ConversionError",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::ExecutionFailure => "ExecutionFailure",
        }
    }

    /// Rejected by the framework before or instead of running the command.
    pub fn is_rejection(self) -> bool {
        self != ErrorKind::ExecutionFailure
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DispatchError {
    pub fn no_such_command(name: impl Into<String>) -> Self {
        Self::NoSuchCommand(name.into())
    }

    /// Classify an error returned by a command's business logic.
    ///
    /// Errors of a framework kind keep that kind; everything else becomes an
    /// execution failure.
    pub fn from_command(command: &str, err: anyhow::Error) -> Self {
        let err = match err.downcast::<DispatchError>() {
            Ok(dispatch) => return dispatch,
            Err(err) => err,
        };
        let err = match err.downcast::<AccessDenied>() {
            Ok(denied) => return Self::AccessDenied(denied),
            Err(err) => err,
        };
        let err = match err.downcast::<AccessError>() {
            Ok(access) => return access.into(),
            Err(err) => err,
        };
        let err = match err.downcast::<BindingError>() {
            Ok(binding) => return Self::Binding(binding),
            Err(err) => err,
        };
        let err = match err.downcast::<ConversionError>() {
            Ok(conversion) => return Self::Conversion(conversion),
            Err(err) => err,
        };
        match err.downcast::<ConfigurationError>() {
            Ok(config) => Self::Configuration(config),
            Err(source) => Self::Execution {
                command: command.to_string(),
                source,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NoSuchCommand(_) => ErrorKind::NoSuchCommand,
            DispatchError::ProtocolMismatch { .. } => ErrorKind::ProtocolMismatch,
            DispatchError::Binding(e) if e.is_missing() => ErrorKind::MissingParameter,
            DispatchError::Binding(_) | DispatchError::Conversion(_) => ErrorKind::ConversionError,
            DispatchError::AccessDenied(_) => ErrorKind::AccessDenied,
            DispatchError::Configuration(_) => ErrorKind::ConfigurationError,
            DispatchError::Execution { .. } => ErrorKind::ExecutionFailure,
        }
    }

    /// Messages of the source chain below this error, outermost first.
    pub fn trace(&self) -> Vec<String> {
        let mut trace = Vec::new();
        let mut next = std::error::Error::source(self);
        while let Some(err) = next {
            trace.push(err.to_string());
            next = err.source();
        }
        trace
    }
}

impl From<AccessError> for DispatchError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Denied(denied) => DispatchError::AccessDenied(denied),
            AccessError::Configuration(config) => DispatchError::Configuration(config),
        }
    }
}
