use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_NAMESPACE: &str = "app";
pub const DEFAULT_PROTOCOL_VERSION: &str = "1";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatcherConfig {
    /// Only commands under this namespace are dispatched.
    #[serde(default = "default_namespace")]
    pub root_namespace: String,

    /// Expected `protocol-version` of incoming requests, compared verbatim.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl DispatcherConfig {
    pub fn new(root_namespace: impl Into<String>) -> Self {
        Self {
            root_namespace: root_namespace.into(),
            protocol_version: default_protocol_version(),
        }
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Read `SWITCHBOARD_NAMESPACE` and `SWITCHBOARD_PROTOCOL_VERSION`.
    pub fn from_env() -> Self {
        let root_namespace = std::env::var("SWITCHBOARD_NAMESPACE").unwrap_or_else(|_| {
            debug!(default = DEFAULT_NAMESPACE, "SWITCHBOARD_NAMESPACE not set");
            default_namespace()
        });
        let protocol_version = std::env::var("SWITCHBOARD_PROTOCOL_VERSION").unwrap_or_else(|_| default_protocol_version());
        Self {
            root_namespace,
            protocol_version,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
