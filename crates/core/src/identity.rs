//! Caller identity resolved by authentication.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Authority (role) identifier, e.g. `ROLE_ADMIN`.
///
/// Authorities are opaque strings at this layer; what they grant is decided
/// by the authorizers that require them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(Cow<'static, str>);

impl Authority {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Authority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Authority {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Authority {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// An authenticated principal and the authorities it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    authorities: BTreeSet<Authority>,
}

impl Identity {
    pub fn new<A>(name: impl Into<String>, authorities: impl IntoIterator<Item = A>) -> Self
    where
        A: Into<Authority>,
    {
        Self {
            name: name.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn authorities(&self) -> &BTreeSet<Authority> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a.as_str() == authority)
    }

    /// True when at least one of `required` is held.
    pub fn has_any_authority<'a>(&self, required: impl IntoIterator<Item = &'a Authority>) -> bool {
        required.into_iter().any(|a| self.authorities.contains(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_checks() {
        let identity = Identity::new("ada", ["ROLE_USER", "ROLE_AUDIT"]);
        assert!(identity.has_authority("ROLE_USER"));
        assert!(!identity.has_authority("ROLE_ADMIN"));

        let wanted = [Authority::from("ROLE_ADMIN"), Authority::from("ROLE_AUDIT")];
        assert!(identity.has_any_authority(&wanted));
        assert!(!identity.has_any_authority(&wanted[..1]));
    }
}
