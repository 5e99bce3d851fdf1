use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use switchboard_core::{Authority, Identity};

/// Signed token claims.
///
/// `auth` carries the authorities comma-joined; `iat`/`exp` are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the identity name.
    pub sub: String,

    pub auth: String,

    pub iat: i64,

    pub exp: i64,
}

impl TokenClaims {
    pub fn new(identity: &Identity, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        let auth = identity
            .authorities()
            .iter()
            .map(Authority::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            sub: identity.name().to_string(),
            auth,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn authorities(&self) -> impl Iterator<Item = Authority> + '_ {
        self.auth
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| Authority::from(a.to_string()))
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.authorities())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this, in the token provider.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(iat: DateTime<Utc>, exp: DateTime<Utc>) -> TokenClaims {
        TokenClaims::new(&Identity::new("ada", ["ROLE_B", "ROLE_A"]), iat, exp)
    }

    #[test]
    fn authorities_are_comma_joined() {
        let now = Utc::now();
        let c = claims(now, now + Duration::minutes(1));
        assert_eq!(c.auth, "ROLE_A,ROLE_B");
        assert_eq!(c.identity(), Identity::new("ada", ["ROLE_A", "ROLE_B"]));
    }

    #[test]
    fn empty_authority_claim_yields_no_authorities() {
        let c = TokenClaims {
            sub: "ada".into(),
            auth: String::new(),
            iat: 0,
            exp: 1,
        };
        assert!(c.identity().authorities().is_empty());
    }

    #[test]
    fn time_window_is_checked() {
        let now = Utc::now();
        let c = claims(now, now + Duration::minutes(10));

        assert_eq!(validate_claims(&c, now), Ok(()));
        assert_eq!(
            validate_claims(&c, now - Duration::minutes(1)),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&c, now + Duration::minutes(10)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims(now, now), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
