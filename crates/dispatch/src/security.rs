use std::sync::Arc;

use switchboard_auth::AccessControl;
use switchboard_core::{Context, Value};

use crate::chain::{Executor, Interceptor};
use crate::command::CommandType;
use crate::error::DispatchError;
use crate::params::Parameters;

/// Enforces the command's access policy before anything further runs.
///
/// Installed outermost by the dispatcher builder, so no other interceptor
/// sees a dispatch the caller may not perform.
#[derive(Debug, Clone)]
pub struct AuthorizationInterceptor {
    access: Arc<AccessControl>,
}

impl AuthorizationInterceptor {
    pub fn new(access: Arc<AccessControl>) -> Self {
        Self { access }
    }
}

impl Interceptor for AuthorizationInterceptor {
    fn intercept(
        &self,
        command: &CommandType,
        params: Parameters,
        ctx: &mut Context,
        next: &dyn Executor,
    ) -> Result<Value, DispatchError> {
        self.access
            .check(command.type_id(), command.name(), command.access(), ctx)?;
        next.execute(command, params, ctx)
    }
}
