//! Per-dispatch context.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::identity::Identity;

/// Raw credentials supplied by the caller (e.g. `token`, `username`).
pub type Credentials = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("attribute '{0}' is immutable")]
    ImmutableAttribute(String),

    #[error("attribute '{0}' is already set")]
    AttributeExists(String),
}

struct Attribute {
    value: Box<dyn Any + Send + Sync>,
    immutable: bool,
}

/// Carries caller credentials, attributes and the resolved identity through
/// one dispatch.
///
/// A context belongs to exactly one dispatch and is discarded afterwards.
/// Attributes come in two write policies: mutable ones may be overwritten,
/// immutable ones are first-write-wins and refuse any later write or removal.
#[derive(Default)]
pub struct Context {
    credentials: Option<Credentials>,
    attributes: HashMap<String, Attribute>,
    identity: Option<Identity>,
    correlation_id: Option<String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials
            .as_ref()
            .and_then(|c| c.get(key))
            .map(String::as_str)
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Set or overwrite a mutable attribute.
    pub fn set_attribute<T>(&mut self, key: impl Into<String>, value: T) -> Result<(), ContextError>
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        if self.attributes.get(&key).is_some_and(|a| a.immutable) {
            return Err(ContextError::ImmutableAttribute(key));
        }
        self.attributes.insert(
            key,
            Attribute {
                value: Box::new(value),
                immutable: false,
            },
        );
        Ok(())
    }

    /// Set an attribute that can never change afterwards.
    pub fn set_immutable_attribute<T>(&mut self, key: impl Into<String>, value: T) -> Result<(), ContextError>
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        if self.attributes.contains_key(&key) {
            return Err(ContextError::AttributeExists(key));
        }
        self.attributes.insert(
            key,
            Attribute {
                value: Box::new(value),
                immutable: true,
            },
        );
        Ok(())
    }

    /// Typed read; `None` if absent or of another type.
    pub fn attribute<T: Any>(&self, key: &str) -> Option<&T> {
        self.attributes
            .get(key)
            .and_then(|a| a.value.downcast_ref::<T>())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Remove a mutable attribute; returns whether one was present.
    pub fn remove_attribute(&mut self, key: &str) -> Result<bool, ContextError> {
        match self.attributes.get(key) {
            Some(a) if a.immutable => Err(ContextError::ImmutableAttribute(key.to_string())),
            Some(_) => Ok(self.attributes.remove(key).is_some()),
            None => Ok(false),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Attach the authenticated caller.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.attributes.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field(
                "credentials",
                &self.credentials.as_ref().map(|c| c.keys().collect::<Vec<_>>()),
            )
            .field("attributes", &keys)
            .field("identity", &self.identity)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}
