//! Command dispatch entry point.
//!
//! This module ties the pieces together: the registry that resolves command
//! names, the interceptor chain, the access-control interceptor and the
//! binder used by the terminal executor.
//!
//! ## Dispatch Flow
//!
//! ```text
//! Request / (name, parameters, context)
//!   ↓
//! 1. Check protocol version (requests only; compared verbatim)
//!   ↓
//! 2. Resolve name → command type (root namespace enforced)
//!   ↓
//! 3. Authorization interceptor (if access control is configured)
//!   ↓
//! 4. User interceptors, first registered = outermost
//!   ↓
//! 5. Terminal executor: instantiate → bind → execute → serialize output
//! ```
//!
//! ## Error Semantics
//!
//! - **Rejections** (`NoSuchCommand`, `ProtocolMismatch`, `MissingParameter`,
//!   `ConversionError`, `AccessDenied`) mean the command never ran.
//! - **Configuration errors** are deployment mistakes. Building the dispatcher
//!   reports duplicates; [`Dispatcher::verify_access`] reports misclassified
//!   commands eagerly, otherwise they surface on first dispatch.
//! - **Execution failures** wrap whatever the command's logic returned, with
//!   the original error kept as the source.
//!
//! Nothing is retried.
//!
//! ## Concurrency
//!
//! A built [`Dispatcher`] is immutable apart from its write-once caches and is
//! meant to be shared (`Arc<Dispatcher>`) across threads. Each dispatch owns
//! its [`Context`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use switchboard_auth::{AccessControl, AccessPolicy};
use switchboard_core::{ConfigurationError, ConversionService, Context, ParameterBinder, ParameterSchema, Value};

use crate::chain::{Executor, Interceptor, build_chain};
use crate::command::{Command, CommandType};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::executor::CommandExecutor;
use crate::params::Parameters;
use crate::protocol::{Request, Response};
use crate::registry::CommandRegistry;
use crate::security::AuthorizationInterceptor;

/// Routes named commands through the interceptor chain.
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: CommandRegistry,
    binder: ParameterBinder,
    access: Option<Arc<AccessControl>>,
    chain: Arc<dyn Executor>,
}

/// Documentation of one registered command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandDescription {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    pub schema: ParameterSchema,
}

impl Dispatcher {
    pub fn builder(config: DispatcherConfig) -> DispatcherBuilder {
        DispatcherBuilder::new(config)
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// The registered descriptor of `C`, if any.
    pub fn command_type<C: Command>(&self) -> Option<&CommandType> {
        self.registry.get(std::any::TypeId::of::<C>())
    }

    /// Resolve `name` and run it through the chain.
    pub fn dispatch(&self, name: &str, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        let command = self.registry.resolve(name)?;
        debug!(command = command.name(), requested = name, "command resolved");
        self.chain.execute(command, params, ctx)
    }

    /// Run an already resolved command type through the chain.
    pub fn dispatch_type(
        &self,
        command: &CommandType,
        params: Parameters,
        ctx: &mut Context,
    ) -> Result<Value, DispatchError> {
        self.registry.ensure_in_namespace(command)?;
        self.chain.execute(command, params, ctx)
    }

    /// Dispatch `C` by type.
    pub fn dispatch_command<C: Command>(&self, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        let command = self
            .command_type::<C>()
            .ok_or_else(|| DispatchError::no_such_command(C::NAME))?;
        self.dispatch_type(command, params, ctx)
    }

    /// Classify every registered command now instead of on first dispatch.
    ///
    /// Without access control there is nothing to check.
    pub fn verify_access(&self) -> Result<(), ConfigurationError> {
        let Some(access) = &self.access else {
            return Ok(());
        };
        for command in self.registry.commands() {
            access.authorizer_for(command.type_id(), command.name(), command.access())?;
        }
        debug!(commands = self.registry.len(), "access classifiers verified");
        Ok(())
    }

    /// Describe every registered command: name, policy and parameters.
    pub fn describe(&self) -> Vec<CommandDescription> {
        self.registry
            .commands()
            .map(|command| CommandDescription {
                name: command.name(),
                access: self.access.as_ref().map(|access| {
                    access
                        .policy_for(command.type_id(), command.name(), command.access())
                        .map(|policy: AccessPolicy| policy.to_string())
                        .unwrap_or_else(|e| e.to_string())
                }),
                schema: ParameterSchema::clone(&command.schema(&self.binder)),
            })
            .collect()
    }

    /// Serve one logical request.
    pub fn handle(&self, request: Request) -> Response {
        let id = request.id.unwrap_or_else(|| Uuid::now_v7().to_string());

        if request.protocol_version != self.config.protocol_version {
            let err = DispatchError::ProtocolMismatch {
                expected: self.config.protocol_version.clone(),
                actual: request.protocol_version,
            };
            warn!(id = %id, error = %err, "request rejected");
            return Response::failure(id, &err);
        }

        let mut ctx = Context::new().with_correlation_id(id.clone());
        if let Some(auth) = request.auth {
            ctx = ctx.with_credentials(auth);
        }

        match self.dispatch(&request.command, Parameters::from_json(request.parameters), &mut ctx) {
            Ok(result) => Response::success(id, result),
            Err(err) => Response::failure(id, &err),
        }
    }
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("commands", &self.registry.len())
            .field("access_control", &self.access.is_some())
            .finish_non_exhaustive()
    }
}

/// Collects commands, interceptors and collaborators for a [`Dispatcher`].
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    commands: Vec<CommandType>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    access: Option<Arc<AccessControl>>,
    conversions: Option<Arc<ConversionService>>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            commands: Vec::new(),
            interceptors: Vec::new(),
            access: None,
            conversions: None,
        }
    }

    /// Register `C`, instantiated with `Default` per dispatch.
    pub fn register<C: Command + Default>(self) -> Self {
        self.command(CommandType::of::<C>())
    }

    /// Register `C` with a factory, e.g. to inject collaborators.
    pub fn register_with<C, F>(self, factory: F) -> Self
    where
        C: Command,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.command(CommandType::with_factory(factory))
    }

    pub fn command(mut self, command: CommandType) -> Self {
        self.commands.push(command);
        self
    }

    /// Append an interceptor; earlier ones wrap later ones.
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Enforce access policies; the check runs before every other interceptor.
    pub fn access_control(mut self, access: Arc<AccessControl>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn conversions(mut self, conversions: Arc<ConversionService>) -> Self {
        self.conversions = Some(conversions);
        self
    }

    pub fn build(self) -> Result<Dispatcher, ConfigurationError> {
        let mut registry = CommandRegistry::new(self.config.root_namespace.clone());
        for command in self.commands {
            registry.register(command)?;
        }

        let binder = ParameterBinder::new(self.conversions.unwrap_or_default());

        let mut interceptors = Vec::with_capacity(self.interceptors.len() + 1);
        if let Some(access) = &self.access {
            interceptors.push(Arc::new(AuthorizationInterceptor::new(Arc::clone(access))) as Arc<dyn Interceptor>);
        }
        interceptors.extend(self.interceptors);

        let terminal: Arc<dyn Executor> = Arc::new(CommandExecutor::new(binder.clone()));
        let chain = build_chain(&interceptors, terminal);

        debug!(
            root = %self.config.root_namespace,
            commands = registry.len(),
            interceptors = interceptors.len(),
            "dispatcher built"
        );

        Ok(Dispatcher {
            config: self.config,
            registry,
            binder,
            access: self.access,
            chain,
        })
    }
}
