use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use switchboard_core::{Context, Identity};

use crate::authenticate::Authenticator;
use crate::policy::{AccessPolicy, AuthoritySet};

/// Why access was refused.
///
/// Missing and bad credentials are deliberately the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Unauthenticated,
    InsufficientAuthority,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::Unauthenticated => f.write_str("authentication required"),
            DenialReason::InsufficientAuthority => f.write_str("insufficient authority"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("access denied to '{command}': {reason}")]
pub struct AccessDenied {
    pub command: String,
    pub reason: DenialReason,
}

impl AccessDenied {
    pub fn new(command: impl Into<String>, reason: DenialReason) -> Self {
        Self {
            command: command.into(),
            reason,
        }
    }
}

/// Decides whether the caller in a context may run a command.
///
/// On success an authorizer that authenticated the caller attaches the
/// resulting identity to the context.
pub trait Authorizer: Send + Sync + fmt::Debug {
    fn policy(&self) -> &AccessPolicy;

    fn authorize(
        &self,
        command: &str,
        ctx: &mut Context,
        authenticator: &dyn Authenticator,
    ) -> Result<(), AccessDenied>;
}

/// Run the authenticator; no identity and authentication errors both deny.
fn authenticate(command: &str, ctx: &Context, authenticator: &dyn Authenticator) -> Result<Identity, AccessDenied> {
    match authenticator.authenticate(ctx) {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => {
            warn!(command, "access denied: no credentials");
            Err(AccessDenied::new(command, DenialReason::Unauthenticated))
        }
        Err(e) => {
            debug!(command, error = %e, "authentication failed");
            warn!(command, "access denied: authentication failed");
            Err(AccessDenied::new(command, DenialReason::Unauthenticated))
        }
    }
}

#[derive(Debug)]
pub struct PublicAuthorizer {
    policy: AccessPolicy,
}

impl Default for PublicAuthorizer {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::Public,
        }
    }
}

impl Authorizer for PublicAuthorizer {
    fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn authorize(&self, _command: &str, _ctx: &mut Context, _authenticator: &dyn Authenticator) -> Result<(), AccessDenied> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct AuthenticatedAuthorizer {
    policy: AccessPolicy,
}

impl Default for AuthenticatedAuthorizer {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::RequiresAuthentication,
        }
    }
}

impl Authorizer for AuthenticatedAuthorizer {
    fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn authorize(&self, command: &str, ctx: &mut Context, authenticator: &dyn Authenticator) -> Result<(), AccessDenied> {
        let identity = authenticate(command, ctx, authenticator)?;
        ctx.set_identity(identity);
        Ok(())
    }
}

/// Requires any one of a fixed set of authorities.
#[derive(Debug)]
pub struct RoleAuthorizer {
    policy: AccessPolicy,
    required: AuthoritySet,
}

impl RoleAuthorizer {
    pub fn new(required: AuthoritySet) -> Self {
        Self {
            policy: AccessPolicy::RequiresAnyOf(required.clone()),
            required,
        }
    }

    pub fn required(&self) -> &AuthoritySet {
        &self.required
    }
}

impl Authorizer for RoleAuthorizer {
    fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    fn authorize(&self, command: &str, ctx: &mut Context, authenticator: &dyn Authenticator) -> Result<(), AccessDenied> {
        let identity = authenticate(command, ctx, authenticator)?;
        if !identity.has_any_authority(&self.required) {
            warn!(command, caller = identity.name(), required = %self.policy, "access denied: insufficient authority");
            return Err(AccessDenied::new(command, DenialReason::InsufficientAuthority));
        }
        ctx.set_identity(identity);
        Ok(())
    }
}

/// Hands out shared authorizers: one per distinct policy.
///
/// Public and authenticated policies use process-wide singletons; role-gated
/// policies share one instance per required-authority set.
#[derive(Debug)]
pub struct AuthorizerRegistry {
    public: Arc<dyn Authorizer>,
    authenticated: Arc<dyn Authorizer>,
    role_gated: RwLock<HashMap<AuthoritySet, Arc<dyn Authorizer>>>,
}

impl AuthorizerRegistry {
    pub fn new() -> Self {
        Self {
            public: Arc::new(PublicAuthorizer::default()),
            authenticated: Arc::new(AuthenticatedAuthorizer::default()),
            role_gated: RwLock::new(HashMap::new()),
        }
    }

    pub fn authorizer_for(&self, policy: &AccessPolicy) -> Arc<dyn Authorizer> {
        let required = match policy {
            AccessPolicy::Public => return Arc::clone(&self.public),
            AccessPolicy::RequiresAuthentication => return Arc::clone(&self.authenticated),
            AccessPolicy::RequiresAnyOf(required) => required,
        };

        if let Some(existing) = self
            .role_gated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(required)
        {
            return Arc::clone(existing);
        }

        let mut gated = self.role_gated.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gated.entry(required.clone()).or_insert_with(|| {
            debug!(policy = %policy, "role authorizer created");
            Arc::new(RoleAuthorizer::new(required.clone()))
        }))
    }

    /// Number of distinct role-gated authorizers.
    pub fn role_gated_len(&self) -> usize {
        self.role_gated.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for AuthorizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
