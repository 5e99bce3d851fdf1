//! Commands served by the `switchboard` binary.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use switchboard_auth::{AccessDenied, DenialReason, InMemoryDirectory, TokenProvider, UserDirectory};
use switchboard_core::{Context, Identity};
use switchboard_dispatch::{Access, Command, bindable};

// ─── Public ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Ping;

bindable!(Ping {});

impl Command for Ping {
    const NAME: &'static str = "app.Ping";
    const ACCESS: &'static [Access] = &[Access::Public];
    type Output = &'static str;

    fn execute(self, _ctx: &mut Context) -> anyhow::Result<&'static str> {
        Ok("pong")
    }
}

/// Exact decimal addition; operands may arrive as numbers or strings.
#[derive(Debug, Default)]
pub struct Add {
    pub a: Decimal,
    pub b: Decimal,
}

bindable!(Add {
    required a: Decimal,
    required b: Decimal,
});

impl Command for Add {
    const NAME: &'static str = "app.math.Add";
    const ACCESS: &'static [Access] = &[Access::Public];
    type Output = Decimal;

    fn execute(self, _ctx: &mut Context) -> anyhow::Result<Decimal> {
        self.a
            .checked_add(self.b)
            .ok_or_else(|| anyhow::anyhow!("{} + {} overflows", self.a, self.b))
    }
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub username: String,
    pub token: String,
}

/// Exchange a username and password for a bearer token.
pub struct Login {
    username: String,
    password: String,
    remember_me: Option<bool>,
    tokens: Arc<TokenProvider>,
    directory: Arc<InMemoryDirectory>,
}

bindable!(Login {
    required username: String,
    required password: String,
    optional remember_me: Option<bool>,
});

impl Login {
    pub fn new(tokens: Arc<TokenProvider>, directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            remember_me: None,
            tokens,
            directory,
        }
    }
}

impl Command for Login {
    const NAME: &'static str = "app.auth.Login";
    const ACCESS: &'static [Access] = &[Access::Public];
    type Output = IssuedToken;

    fn execute(self, _ctx: &mut Context) -> anyhow::Result<IssuedToken> {
        let record = self
            .directory
            .find(&self.username)
            .filter(|record| record.verify_password(&self.password))
            .ok_or_else(|| AccessDenied::new(Self::NAME, DenialReason::Unauthenticated))?;

        let token = self
            .tokens
            .create_token(&record.identity(), self.remember_me.unwrap_or(false))?;
        Ok(IssuedToken {
            username: self.username,
            token,
        })
    }
}

// ─── Authenticated ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct WhoAmI;

bindable!(WhoAmI {});

impl Command for WhoAmI {
    const NAME: &'static str = "app.WhoAmI";
    const ACCESS: &'static [Access] = &[Access::Authenticated];
    type Output = Identity;

    fn execute(self, ctx: &mut Context) -> anyhow::Result<Identity> {
        ctx.identity()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("authenticated dispatch without an identity"))
    }
}

// ─── Admin ───────────────────────────────────────────────────────────────────

pub struct ListUsers {
    directory: Arc<InMemoryDirectory>,
}

bindable!(ListUsers {});

impl ListUsers {
    pub fn new(directory: Arc<InMemoryDirectory>) -> Self {
        Self { directory }
    }
}

impl Command for ListUsers {
    const NAME: &'static str = "app.admin.ListUsers";
    const ACCESS: &'static [Access] = &[Access::RolesAllowed(&["ROLE_ADMIN"])];
    type Output = Vec<String>;

    fn execute(self, _ctx: &mut Context) -> anyhow::Result<Vec<String>> {
        Ok(self.directory.usernames())
    }
}
