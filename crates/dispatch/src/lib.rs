//! Named-command dispatch with parameter binding, interceptors and access
//! control.
//!
//! ```ignore
//! let dispatcher = Dispatcher::builder(DispatcherConfig::new("app"))
//!     .register::<CreateUser>()
//!     .interceptor(TracingInterceptor)
//!     .access_control(access)
//!     .build()?;
//!
//! let out = dispatcher.dispatch("users.Create", Parameters::empty().with("name", "ada"), &mut ctx)?;
//! ```

pub mod chain;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod logging;
pub mod params;
pub mod protocol;
pub mod registry;
pub mod security;

pub use chain::{Executor, Interceptor, build_chain};
pub use command::{Command, CommandType};
pub use config::DispatcherConfig;
pub use dispatcher::{CommandDescription, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, ErrorKind};
pub use executor::CommandExecutor;
pub use logging::TracingInterceptor;
pub use params::Parameters;
pub use protocol::{ErrorBody, Request, Response};
pub use registry::CommandRegistry;
pub use security::AuthorizationInterceptor;

pub use switchboard_auth::Access;
pub use switchboard_core::{Context, Value, bindable};
