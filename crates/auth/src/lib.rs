//! `switchboard-auth`: access policies, authentication and tokens.
//!
//! This crate knows nothing about command dispatch; it decides whether the
//! caller described by a [`Context`](switchboard_core::Context) may run a
//! command with a given set of access classifiers.

pub mod access;
pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod directory;
pub mod policy;
pub mod token;

pub use access::{AccessControl, AccessError};
pub use authenticate::{
    AuthenticationError, Authenticator, AuthenticatorChain, PasswordAuthenticator, TokenAuthenticator,
};
pub use authorize::{AccessDenied, Authorizer, AuthorizerRegistry, DenialReason};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use directory::{InMemoryDirectory, UserDirectory, UserRecord};
pub use policy::{Access, AccessPolicy, AuthoritySet};
pub use token::{TokenConfig, TokenError, TokenProvider};

pub use switchboard_core::{Authority, Identity};
