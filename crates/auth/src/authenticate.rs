//! Authentication strategies: context credentials → [`Identity`].
//!
//! A strategy returns `Ok(None)` when the credentials it understands are not
//! present at all, and an [`AuthenticationError`] only when they are present
//! but unusable. The distinction matters to [`AuthenticatorChain`], which
//! moves on after `None` but stops at the first error.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use switchboard_core::{ConfigurationError, Context, Identity};

use crate::directory::UserDirectory;
use crate::token::TokenProvider;

/// Credential keys read by the built-in strategies.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const AUTHORIZATION: &str = "authorization";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("malformed credentials: {0}")]
    Malformed(String),

    #[error("bad credentials")]
    BadCredentials,
}

impl AuthenticationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Turns the credentials of a [`Context`] into an [`Identity`].
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, ctx: &Context) -> Result<Option<Identity>, AuthenticationError>;
}

impl<F> Authenticator for F
where
    F: Fn(&Context) -> Result<Option<Identity>, AuthenticationError> + Send + Sync,
{
    fn authenticate(&self, ctx: &Context) -> Result<Option<Identity>, AuthenticationError> {
        self(ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chain
// ─────────────────────────────────────────────────────────────────────────────

/// Tries strategies in order; the first identity wins.
pub struct AuthenticatorChain {
    strategies: Vec<Arc<dyn Authenticator>>,
}

impl AuthenticatorChain {
    /// An empty strategy list is rejected.
    pub fn new(strategies: Vec<Arc<dyn Authenticator>>) -> Result<Self, ConfigurationError> {
        if strategies.is_empty() {
            return Err(ConfigurationError::new("authenticator chain has no strategies"));
        }
        Ok(Self { strategies })
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Authenticator for AuthenticatorChain {
    fn authenticate(&self, ctx: &Context) -> Result<Option<Identity>, AuthenticationError> {
        for strategy in &self.strategies {
            if let Some(identity) = strategy.authenticate(ctx)? {
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }
}

impl core::fmt::Debug for AuthenticatorChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthenticatorChain")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticates with a signed token.
///
/// Reads the `token` credential, or an `authorization` credential of the form
/// `Bearer <token>`, the scheme matched case-insensitively. Tokens that fail
/// verification are treated as absent.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    provider: Arc<TokenProvider>,
}

impl TokenAuthenticator {
    pub fn new(provider: Arc<TokenProvider>) -> Self {
        Self { provider }
    }

    fn extract<'a>(ctx: &'a Context) -> Result<Option<&'a str>, AuthenticationError> {
        if let Some(token) = ctx.credential(keys::TOKEN) {
            return Ok(Some(token.trim()));
        }
        let Some(header) = ctx.credential(keys::AUTHORIZATION) else {
            return Ok(None);
        };
        let token = header
            .trim_start()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .ok_or_else(|| AuthenticationError::malformed("authorization is not a bearer credential"))?;
        if token.is_empty() {
            return Err(AuthenticationError::malformed("empty bearer token"));
        }
        Ok(Some(token))
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, ctx: &Context) -> Result<Option<Identity>, AuthenticationError> {
        match Self::extract(ctx)? {
            Some(token) => Ok(self.provider.caller_identity(token)),
            None => Ok(None),
        }
    }
}

/// Authenticates `username`/`password` credentials against a directory.
#[derive(Clone)]
pub struct PasswordAuthenticator {
    directory: Arc<dyn UserDirectory>,
}

impl PasswordAuthenticator {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

impl Authenticator for PasswordAuthenticator {
    fn authenticate(&self, ctx: &Context) -> Result<Option<Identity>, AuthenticationError> {
        let (username, password) = match (ctx.credential(keys::USERNAME), ctx.credential(keys::PASSWORD)) {
            (None, None) => return Ok(None),
            (Some(u), Some(p)) => (u, p),
            _ => return Err(AuthenticationError::malformed("username and password must be given together")),
        };

        let user = self.directory.find(username).ok_or_else(|| {
            debug!(username, "unknown user");
            AuthenticationError::BadCredentials
        })?;
        if !user.verify_password(password) {
            debug!(username, "password mismatch");
            return Err(AuthenticationError::BadCredentials);
        }
        Ok(Some(user.identity()))
    }
}

impl core::fmt::Debug for PasswordAuthenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordAuthenticator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::token::TokenConfig;
    use switchboard_core::Credentials;

    type Outcome = Result<Option<Identity>, AuthenticationError>;

    fn ctx(entries: &[(&str, &str)]) -> Context {
        let creds: Credentials = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Context::new().with_credentials(creds)
    }

    fn directory() -> Arc<dyn UserDirectory> {
        Arc::new(InMemoryDirectory::new().with_user("ada", "secret", ["ROLE_USER"]))
    }

    fn provider() -> Arc<TokenProvider> {
        Arc::new(TokenProvider::new(TokenConfig::new("test-secret")).unwrap())
    }

    #[test]
    fn password_strategy_outcomes() {
        let auth = PasswordAuthenticator::new(directory());

        assert_eq!(auth.authenticate(&Context::new()), Ok(None));
        assert_eq!(
            auth.authenticate(&ctx(&[("username", "ada"), ("password", "secret")]))
                .unwrap()
                .map(|i| i.name().to_string()),
            Some("ada".to_string())
        );
        assert_eq!(
            auth.authenticate(&ctx(&[("username", "ada"), ("password", "nope")])),
            Err(AuthenticationError::BadCredentials)
        );
        assert_eq!(
            auth.authenticate(&ctx(&[("username", "bob"), ("password", "secret")])),
            Err(AuthenticationError::BadCredentials)
        );
        assert!(matches!(
            auth.authenticate(&ctx(&[("username", "ada")])),
            Err(AuthenticationError::Malformed(_))
        ));
    }

    #[test]
    fn token_strategy_reads_both_credential_forms() {
        let provider = provider();
        let auth = TokenAuthenticator::new(Arc::clone(&provider));
        let token = provider.create_token(&Identity::new("ada", ["ROLE_USER"]), false).unwrap();

        let direct = auth.authenticate(&ctx(&[("token", token.as_str())])).unwrap().unwrap();
        assert_eq!(direct.name(), "ada");

        let bearer = format!("Bearer {token}");
        let header = auth.authenticate(&ctx(&[("authorization", bearer.as_str())])).unwrap().unwrap();
        assert_eq!(header, direct);

        assert_eq!(auth.authenticate(&ctx(&[("token", "garbage")])), Ok(None));
        assert!(auth.authenticate(&ctx(&[("authorization", "Basic abc")])).is_err());
        assert!(auth.authenticate(&ctx(&[("authorization", "Bearer  ")])).is_err());
        assert!(auth.authenticate(&ctx(&[("authorization", "Bearer")])).is_err());
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let provider = provider();
        let auth = TokenAuthenticator::new(Arc::clone(&provider));
        let token = provider.create_token(&Identity::new("ada", ["ROLE_USER"]), false).unwrap();

        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let header = format!("{scheme} {token}");
            let identity = auth.authenticate(&ctx(&[("authorization", header.as_str())])).unwrap();
            assert_eq!(identity.map(|i| i.name().to_string()), Some("ada".to_string()));
        }
    }

    #[test]
    fn lowercase_bearer_header_does_not_block_password_fallback() {
        let provider = provider();
        let chain = AuthenticatorChain::new(vec![
            Arc::new(TokenAuthenticator::new(Arc::clone(&provider))) as Arc<dyn Authenticator>,
            Arc::new(PasswordAuthenticator::new(directory())),
        ])
        .unwrap();

        let found = chain
            .authenticate(&ctx(&[
                ("authorization", "bearer stale-token"),
                ("username", "ada"),
                ("password", "secret"),
            ]))
            .unwrap()
            .unwrap();
        assert_eq!(found.name(), "ada");
    }

    #[test]
    fn chain_returns_first_identity_and_stops_on_error() {
        let never = |_: &Context| -> Outcome { Ok(None) };
        let fallback = |_: &Context| -> Outcome { Ok(Some(Identity::new("fallback", Vec::<&'static str>::new()))) };
        let chain = AuthenticatorChain::new(vec![
            Arc::new(never),
            Arc::new(PasswordAuthenticator::new(directory())),
            Arc::new(fallback),
        ])
        .unwrap();

        let found = chain.authenticate(&Context::new()).unwrap().unwrap();
        assert_eq!(found.name(), "fallback");

        let found = chain
            .authenticate(&ctx(&[("username", "ada"), ("password", "secret")]))
            .unwrap()
            .unwrap();
        assert_eq!(found.name(), "ada");

        assert!(chain.authenticate(&ctx(&[("password", "secret")])).is_err());
    }

    #[test]
    fn chain_of_nothing_yields_none() {
        let chain = AuthenticatorChain::new(vec![Arc::new(|_: &Context| -> Outcome { Ok(None) })]).unwrap();
        assert_eq!(chain.authenticate(&Context::new()), Ok(None));
    }

    #[test]
    fn empty_chain_is_a_configuration_error() {
        assert!(AuthenticatorChain::new(Vec::new()).is_err());
    }
}
