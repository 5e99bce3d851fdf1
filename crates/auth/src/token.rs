//! Signed, time-limited identity tokens (HS512 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use switchboard_core::{ConfigurationError, Identity};

use crate::claims::{TokenClaims, validate_claims};

pub const DEFAULT_VALIDITY_SECS: u64 = 86_400;
pub const DEFAULT_REMEMBER_ME_SECS: u64 = 2_592_000;

const DEV_SECRET: &str = "switchboard-dev-secret";

fn default_validity() -> u64 {
    DEFAULT_VALIDITY_SECS
}

fn default_remember_me() -> u64 {
    DEFAULT_REMEMBER_ME_SECS
}

/// Token provider settings. The key is fixed for the process lifetime.
#[derive(Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: String,

    #[serde(default = "default_validity")]
    pub validity_secs: u64,

    #[serde(default = "default_remember_me")]
    pub remember_me_secs: u64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            validity_secs: DEFAULT_VALIDITY_SECS,
            remember_me_secs: DEFAULT_REMEMBER_ME_SECS,
        }
    }

    /// Read `SWITCHBOARD_TOKEN_*` from the environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let secret = std::env::var("SWITCHBOARD_TOKEN_SECRET").unwrap_or_else(|_| {
            warn!("SWITCHBOARD_TOKEN_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });
        let config = Self {
            secret,
            validity_secs: secs_from_env("SWITCHBOARD_TOKEN_VALIDITY_SECS", DEFAULT_VALIDITY_SECS)?,
            remember_me_secs: secs_from_env("SWITCHBOARD_TOKEN_REMEMBER_ME_SECS", DEFAULT_REMEMBER_ME_SECS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// A zero window would make every issued token expire on creation.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.validity_secs == 0 {
            return Err(ConfigurationError::new("token validity must be at least one second"));
        }
        if self.remember_me_secs == 0 {
            return Err(ConfigurationError::new("remember-me token validity must be at least one second"));
        }
        Ok(())
    }
}

fn secs_from_env(key: &str, default: u64) -> Result<u64, ConfigurationError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigurationError::new(format!("{key}: invalid number of seconds '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("validity_secs", &self.validity_secs)
            .field("remember_me_secs", &self.remember_me_secs)
            .finish()
    }
}

#[derive(Debug, Error)]
#[error("token signing failed: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Issues and verifies identity tokens.
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: Duration,
    remember_me: Duration,
}

impl TokenProvider {
    pub fn new(config: TokenConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS512);
        // Time window is checked by validate_claims against an explicit clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            validity: secs(config.validity_secs),
            remember_me: secs(config.remember_me_secs),
        })
    }

    pub fn create_token(&self, identity: &Identity, remember_me: bool) -> Result<String, TokenError> {
        self.create_token_at(identity, remember_me, Utc::now())
    }

    pub fn create_token_at(
        &self,
        identity: &Identity,
        remember_me: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let window = if remember_me { self.remember_me } else { self.validity };
        let claims = TokenClaims::new(identity, now, now + window);
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)?;
        debug!(subject = identity.name(), remember_me, "token issued");
        Ok(token)
    }

    /// Identity carried by `token`, or `None` if it is malformed, forged or
    /// outside its validity window.
    pub fn caller_identity(&self, token: &str) -> Option<Identity> {
        self.caller_identity_at(token, Utc::now())
    }

    pub fn caller_identity_at(&self, token: &str, now: DateTime<Utc>) -> Option<Identity> {
        let claims = match jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "token rejected");
                return None;
            }
        };
        if let Err(e) = validate_claims(&claims, now) {
            debug!(subject = %claims.sub, error = %e, "token rejected");
            return None;
        }
        Some(claims.identity())
    }
}

/// Upper bound on a validity window, ~100 years.
const MAX_WINDOW_SECS: i64 = 100 * 365 * 86_400;

fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(MAX_WINDOW_SECS).min(MAX_WINDOW_SECS))
}

impl core::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("validity", &self.validity)
            .field("remember_me", &self.remember_me)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(secret: &str) -> TokenProvider {
        TokenProvider::new(TokenConfig {
            secret: secret.to_string(),
            validity_secs: 60,
            remember_me_secs: 3_600,
        })
        .unwrap()
    }

    #[test]
    fn issued_token_carries_identity() {
        let p = provider("k");
        let ada = Identity::new("ada", ["ROLE_USER", "ROLE_ADMIN"]);
        let token = p.create_token(&ada, false).unwrap();
        assert_eq!(p.caller_identity(&token), Some(ada));
    }

    #[test]
    fn validity_depends_on_remember_me() {
        let p = provider("k");
        let now = Utc::now();
        let ada = Identity::new("ada", ["ROLE_USER"]);

        let short = p.create_token_at(&ada, false, now).unwrap();
        let long = p.create_token_at(&ada, true, now).unwrap();
        let later = now + Duration::seconds(120);

        assert!(p.caller_identity_at(&short, now).is_some());
        assert!(p.caller_identity_at(&short, later).is_none());
        assert!(p.caller_identity_at(&long, later).is_some());
        assert!(p.caller_identity_at(&long, now + Duration::hours(2)).is_none());
    }

    #[test]
    fn forged_and_malformed_tokens_yield_no_identity() {
        let ada = Identity::new("ada", ["ROLE_ADMIN"]);
        let forged = provider("other").create_token(&ada, false).unwrap();

        let p = provider("k");
        assert_eq!(p.caller_identity(&forged), None);
        assert_eq!(p.caller_identity("not.a.token"), None);
        assert_eq!(p.caller_identity(""), None);
    }

    #[test]
    fn zero_validity_windows_are_rejected() {
        let mut config = TokenConfig::new("k");
        config.validity_secs = 0;
        let err = TokenProvider::new(config).unwrap_err();
        assert!(err.message().contains("validity"));

        let mut config = TokenConfig::new("k");
        config.remember_me_secs = 0;
        assert!(TokenProvider::new(config).is_err());
    }

    #[test]
    fn one_second_window_is_valid_when_issued() {
        let p = TokenProvider::new(TokenConfig {
            secret: "k".to_string(),
            validity_secs: 1,
            remember_me_secs: 1,
        })
        .unwrap();
        let now = Utc::now();
        let token = p.create_token_at(&Identity::new("ada", ["ROLE_USER"]), false, now).unwrap();

        assert!(p.caller_identity_at(&token, now).is_some());
        assert!(p.caller_identity_at(&token, now + Duration::seconds(1)).is_none());
    }

    #[test]
    fn config_debug_redacts_secret() {
        let rendered = format!("{:?}", TokenConfig::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: TokenConfig = serde_json::from_str(r#"{"secret":"s"}"#).unwrap();
        assert_eq!(config.validity_secs, DEFAULT_VALIDITY_SECS);
        assert_eq!(config.remember_me_secs, DEFAULT_REMEMBER_ME_SECS);
    }
}
