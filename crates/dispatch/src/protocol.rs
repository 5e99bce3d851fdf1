//! Logical request/response shapes exchanged with transports.
//!
//! Bytes are the transport's concern; these types only fix the field names:
//!
//! ```json
//! {"id": "1", "protocol-version": "1", "command": "users.Create",
//!  "parameters": {"name": "ada"}, "auth": {"token": "..."}}
//!
//! {"id": "1", "result": {...}}
//! {"id": "1", "error": {"message": "...", "type": "AccessDenied", "trace": []}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use switchboard_core::{Credentials, Value};

use crate::error::{DispatchError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "protocol-version")]
    pub protocol_version: String,

    pub command: String,

    #[serde(default)]
    pub parameters: Map<String, JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,
}

impl Request {
    pub fn new(protocol_version: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: None,
            protocol_version: protocol_version.into(),
            command: command.into(),
            parameters: Map::new(),
            auth: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth
            .get_or_insert_with(Credentials::new)
            .insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,

    #[serde(rename = "type")]
    pub kind: ErrorKind,

    #[serde(default)]
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            result: Some(result.into_json()),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, err: &DispatchError) -> Self {
        Self {
            id: id.into(),
            result: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                kind: err.kind(),
                trace: err.trace(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
