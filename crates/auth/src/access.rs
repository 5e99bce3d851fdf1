//! Access control: classify, authorize, attach identity.
//!
//! [`AccessControl`] is the single entry point the dispatcher uses before a
//! command runs. For each command type it:
//!
//! 1. classifies the declared [`Access`] classifiers into an [`AccessPolicy`]
//!    (once per type; a misconfigured type stays an error for the life of the
//!    process),
//! 2. fetches the shared [`Authorizer`] for that policy,
//! 3. authorizes the caller in the [`Context`] with the configured
//!    [`Authenticator`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use switchboard_core::{ConfigurationError, Context};

use crate::authenticate::Authenticator;
use crate::authorize::{AccessDenied, Authorizer, AuthorizerRegistry};
use crate::policy::{Access, AccessPolicy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

type Classification = Result<Arc<dyn Authorizer>, ConfigurationError>;

pub struct AccessControl {
    authenticator: Arc<dyn Authenticator>,
    authorizers: AuthorizerRegistry,
    classified: RwLock<HashMap<TypeId, Classification>>,
}

impl AccessControl {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            authorizers: AuthorizerRegistry::new(),
            classified: RwLock::new(HashMap::new()),
        }
    }

    pub fn authorizers(&self) -> &AuthorizerRegistry {
        &self.authorizers
    }

    /// The shared authorizer for a command type, classifying it on first use.
    pub fn authorizer_for(
        &self,
        key: TypeId,
        command: &str,
        classifiers: &[Access],
    ) -> Result<Arc<dyn Authorizer>, ConfigurationError> {
        if let Some(cached) = self
            .classified
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return cached.clone();
        }

        let mut classified = self.classified.write().unwrap_or_else(PoisonError::into_inner);
        classified
            .entry(key)
            .or_insert_with(|| {
                let policy = AccessPolicy::classify(command, classifiers)?;
                debug!(command, policy = %policy, "command classified");
                Ok(self.authorizers.authorizer_for(&policy))
            })
            .clone()
    }

    pub fn policy_for(
        &self,
        key: TypeId,
        command: &str,
        classifiers: &[Access],
    ) -> Result<AccessPolicy, ConfigurationError> {
        self.authorizer_for(key, command, classifiers)
            .map(|a| a.policy().clone())
    }

    /// Authorize the caller for one command; on success the context carries
    /// the caller identity when the policy required authentication.
    pub fn check(
        &self,
        key: TypeId,
        command: &str,
        classifiers: &[Access],
        ctx: &mut Context,
    ) -> Result<(), AccessError> {
        let authorizer = self.authorizer_for(key, command, classifiers)?;
        authorizer.authorize(command, ctx, self.authenticator.as_ref())?;
        Ok(())
    }
}

impl core::fmt::Debug for AccessControl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessControl")
            .field("authorizers", &self.authorizers)
            .finish_non_exhaustive()
    }
}
