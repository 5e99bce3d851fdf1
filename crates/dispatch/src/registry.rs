//! Name → command type resolution under a root namespace.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use switchboard_core::ConfigurationError;

use crate::command::CommandType;
use crate::error::DispatchError;

/// Registered command types, resolvable by name.
///
/// Names may be given fully qualified (`app.users.Create`) or relative to the
/// root namespace (`users.Create`). A type registered under a name outside
/// the root namespace can be registered but never dispatched.
#[derive(Debug)]
pub struct CommandRegistry {
    root: String,
    by_name: BTreeMap<&'static str, CommandType>,
    by_type: HashMap<TypeId, &'static str>,
}

impl CommandRegistry {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            by_name: BTreeMap::new(),
            by_type: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn register(&mut self, command: CommandType) -> Result<(), ConfigurationError> {
        if self.by_name.contains_key(command.name()) {
            return Err(ConfigurationError::new(format!(
                "command '{}' registered twice",
                command.name()
            )));
        }
        if !self.in_namespace(command.name()) {
            warn!(command = command.name(), root = %self.root, "registered command lies outside the root namespace");
        }
        debug!(command = command.name(), "command registered");
        self.by_type.insert(command.type_id(), command.name());
        self.by_name.insert(command.name(), command);
        Ok(())
    }

    /// Whether `name` lives under the root namespace.
    pub fn in_namespace(&self, name: &str) -> bool {
        self.root.is_empty()
            || name
                .strip_prefix(self.root.as_str())
                .is_some_and(|rest| rest.starts_with('.') && rest.len() > 1)
    }

    /// An exact match outside the root namespace never hides the root-relative
    /// command of the same name.
    pub fn resolve(&self, name: &str) -> Result<&CommandType, DispatchError> {
        let exact = self.by_name.get(name);
        if let Some(command) = exact.filter(|c| self.in_namespace(c.name())) {
            return Ok(command);
        }
        let qualified = format!("{}.{}", self.root, name);
        if let Some(command) = self.by_name.get(qualified.as_str()) {
            return Ok(command);
        }
        let Some(command) = exact else {
            debug!(command = name, "unknown command");
            return Err(DispatchError::no_such_command(name));
        };
        self.ensure_in_namespace(command)?;
        Ok(command)
    }

    /// Reject a command type that lives outside the root namespace.
    pub fn ensure_in_namespace(&self, command: &CommandType) -> Result<(), DispatchError> {
        if self.in_namespace(command.name()) {
            Ok(())
        } else {
            warn!(command = command.name(), root = %self.root, "command outside root namespace rejected");
            Err(DispatchError::no_such_command(command.name()))
        }
    }

    pub fn get(&self, type_id: TypeId) -> Option<&CommandType> {
        self.by_type.get(&type_id).and_then(|name| self.by_name.get(name))
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandType> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
