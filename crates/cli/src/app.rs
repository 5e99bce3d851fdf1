use std::sync::Arc;

use tracing::warn;

use switchboard_auth::{
    AccessControl, Authenticator, AuthenticatorChain, InMemoryDirectory, PasswordAuthenticator, TokenAuthenticator,
    TokenConfig, TokenProvider, UserRecord,
};
use switchboard_core::{Authority, ConfigurationError};
use switchboard_dispatch::{Dispatcher, DispatcherConfig, TracingInterceptor};

use crate::commands::{Add, ListUsers, Login, Ping, WhoAmI};

const DEV_USERS: &str = "admin:admin:ROLE_ADMIN|ROLE_USER";

#[derive(Debug)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub token: TokenConfig,
    pub users: Vec<UserRecord>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let users = std::env::var("SWITCHBOARD_USERS").unwrap_or_else(|_| {
            warn!("SWITCHBOARD_USERS not set; using insecure dev default");
            DEV_USERS.to_string()
        });
        Ok(Self {
            dispatcher: DispatcherConfig::from_env(),
            token: TokenConfig::from_env()?,
            users: parse_users(&users)?,
        })
    }
}

/// Parse `name:password:ROLE_A|ROLE_B` entries separated by `;`.
pub fn parse_users(raw: &str) -> Result<Vec<UserRecord>, ConfigurationError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let (Some(name), Some(password)) = (parts.next(), parts.next()) else {
                return Err(ConfigurationError::new(format!(
                    "user entry '{}' must look like name:password[:ROLES]",
                    entry.split(':').next().unwrap_or_default()
                )));
            };
            if name.is_empty() {
                return Err(ConfigurationError::new("user entry with an empty name"));
            }
            let authorities = parts
                .next()
                .unwrap_or_default()
                .split('|')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(|role| Authority::new(role.to_string()));
            Ok(UserRecord::new(name, password, authorities))
        })
        .collect()
}

/// Wire the demo commands, authentication and logging into a dispatcher.
pub fn build_dispatcher(config: AppConfig) -> Result<Dispatcher, ConfigurationError> {
    let directory = Arc::new(InMemoryDirectory::new());
    for user in config.users {
        directory.insert(user);
    }
    let tokens = Arc::new(TokenProvider::new(config.token)?);

    let authenticator = AuthenticatorChain::new(vec![
        Arc::new(TokenAuthenticator::new(Arc::clone(&tokens))) as Arc<dyn Authenticator>,
        Arc::new(PasswordAuthenticator::new(directory.clone())),
    ])?;

    let login_tokens = Arc::clone(&tokens);
    let login_directory = Arc::clone(&directory);
    let admin_directory = Arc::clone(&directory);

    let dispatcher = Dispatcher::builder(config.dispatcher)
        .register::<Ping>()
        .register::<Add>()
        .register::<WhoAmI>()
        .register_with(move || Login::new(Arc::clone(&login_tokens), Arc::clone(&login_directory)))
        .register_with(move || ListUsers::new(Arc::clone(&admin_directory)))
        .interceptor(TracingInterceptor)
        .access_control(Arc::new(AccessControl::new(Arc::new(authenticator))))
        .build()?;

    dispatcher.verify_access()?;
    Ok(dispatcher)
}
