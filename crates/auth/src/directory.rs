//! User lookup for password authentication.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use switchboard_core::{Authority, Identity};

const SALT_LEN: usize = 16;

/// A stored user: name, salted password digest and granted authorities.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    username: String,
    salt: [u8; SALT_LEN],
    password_digest: [u8; 32],
    authorities: BTreeSet<Authority>,
}

impl UserRecord {
    pub fn new<A>(username: impl Into<String>, password: &str, authorities: impl IntoIterator<Item = A>) -> Self
    where
        A: Into<Authority>,
    {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self {
            username: username.into(),
            salt,
            password_digest: digest(&salt, password),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn authorities(&self) -> &BTreeSet<Authority> {
        &self.authorities
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password_digest[..].ct_eq(&digest(&self.salt, candidate)[..]).into()
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.authorities.iter().cloned())
    }
}

impl core::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("authorities", &self.authorities)
            .finish_non_exhaustive()
    }
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Source of user records.
pub trait UserDirectory: Send + Sync {
    fn find(&self, username: &str) -> Option<UserRecord>;
}

/// Process-local directory for tests and demos.
///
/// Passwords are kept as salted SHA-256 digests. A single fast hash is not a
/// password KDF, so this directory must not hold production credentials.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user<A>(self, username: &str, password: &str, authorities: impl IntoIterator<Item = A>) -> Self
    where
        A: Into<Authority>,
    {
        self.insert(UserRecord::new(username, password, authorities));
        self
    }

    /// Add or replace a user.
    pub fn insert(&self, record: UserRecord) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.username.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted usernames.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl UserDirectory for InMemoryDirectory {
    fn find(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }
}
