use std::time::Instant;

use tracing::{debug, error, info_span, warn};

use switchboard_core::{Context, Value};

use crate::chain::{Executor, Interceptor};
use crate::command::CommandType;
use crate::error::{DispatchError, ErrorKind};
use crate::params::Parameters;

/// One span per dispatch, with timing and the outcome.
///
/// Rejections are logged at `warn`, command failures at `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn intercept(
        &self,
        command: &CommandType,
        params: Parameters,
        ctx: &mut Context,
        next: &dyn Executor,
    ) -> Result<Value, DispatchError> {
        let span = info_span!(
            "dispatch",
            command = command.name(),
            correlation_id = ctx.correlation_id().unwrap_or("-"),
        );
        let _guard = span.enter();

        let started = Instant::now();
        let result = next.execute(command, params, ctx);
        let elapsed_us = started.elapsed().as_micros() as u64;

        match &result {
            Ok(_) => debug!(elapsed_us, "command completed"),
            Err(e) if e.kind() == ErrorKind::ExecutionFailure => {
                error!(elapsed_us, error = %e, trace = ?e.trace(), "command failed")
            }
            Err(e) => warn!(elapsed_us, kind = %e.kind(), error = %e, "command rejected"),
        }
        result
    }
}
