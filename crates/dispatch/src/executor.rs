use switchboard_core::{Context, ParameterBinder, Value};

use crate::chain::Executor;
use crate::command::CommandType;
use crate::error::DispatchError;
use crate::params::Parameters;

/// Innermost link of the chain: instantiate, bind, execute.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    binder: ParameterBinder,
}

impl CommandExecutor {
    pub fn new(binder: ParameterBinder) -> Self {
        Self { binder }
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }
}

impl Executor for CommandExecutor {
    fn execute(&self, command: &CommandType, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        command.invoke(&self.binder, &params, ctx)
    }
}
