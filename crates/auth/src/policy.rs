//! Access classifiers and the policy derived from them.

use std::collections::BTreeSet;
use std::fmt;

use switchboard_core::{Authority, ConfigurationError};

/// Set of authorities a role-gated command accepts (any one suffices).
pub type AuthoritySet = BTreeSet<Authority>;

/// Access classifier declared on a command type.
///
/// A command declares exactly one; they are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Runs without authentication.
    Public,
    /// Requires an authenticated caller.
    Authenticated,
    /// Requires an authenticated caller holding any of the listed authorities.
    RolesAllowed(&'static [&'static str]),
}

/// The resolved access policy of one command type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    RequiresAuthentication,
    RequiresAnyOf(AuthoritySet),
}

impl AccessPolicy {
    /// Derive the policy from a command's declared classifiers.
    ///
    /// No classifier, more than one, or a role list without roles is a
    /// deployment mistake and fails instead of defaulting.
    pub fn classify(command: &str, classifiers: &[Access]) -> Result<Self, ConfigurationError> {
        match classifiers {
            [] => Err(ConfigurationError::new(format!(
                "command '{command}' declares no access classifier"
            ))),
            [Access::Public] => Ok(AccessPolicy::Public),
            [Access::Authenticated] => Ok(AccessPolicy::RequiresAuthentication),
            [Access::RolesAllowed(roles)] => {
                let set: AuthoritySet = roles.iter().map(|r| Authority::from(*r)).collect();
                if set.is_empty() {
                    return Err(ConfigurationError::new(format!(
                        "command '{command}' allows an empty role list"
                    )));
                }
                Ok(AccessPolicy::RequiresAnyOf(set))
            }
            many => Err(ConfigurationError::new(format!(
                "command '{command}' declares {} mutually exclusive access classifiers",
                many.len()
            ))),
        }
    }

    pub fn requires_authentication(&self) -> bool {
        !matches!(self, AccessPolicy::Public)
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPolicy::Public => f.write_str("public"),
            AccessPolicy::RequiresAuthentication => f.write_str("authenticated"),
            AccessPolicy::RequiresAnyOf(set) => {
                let names: Vec<&str> = set.iter().map(Authority::as_str).collect();
                write!(f, "any of [{}]", names.join(", "))
            }
        }
    }
}
