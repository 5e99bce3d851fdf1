//! Interceptor chain around a terminal executor.
//!
//! ```text
//! dispatch
//!   ↓
//! interceptor #1 ── may stop here (never calls `next`)
//!   ↓ next.execute(..)
//! interceptor #2
//!   ↓ next.execute(..)
//! terminal executor (instantiate → bind → execute)
//! ```
//!
//! The chain is composed once, from the last interceptor to the first, and is
//! immutable afterwards; one chain serves every dispatch on every thread.

use std::sync::Arc;

use switchboard_core::{Context, Value};

use crate::command::CommandType;
use crate::error::DispatchError;
use crate::params::Parameters;

/// Runs a command; the terminal executor or the rest of a chain.
pub trait Executor: Send + Sync {
    fn execute(&self, command: &CommandType, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError>;
}

impl<F> Executor for F
where
    F: Fn(&CommandType, Parameters, &mut Context) -> Result<Value, DispatchError> + Send + Sync,
{
    fn execute(&self, command: &CommandType, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        self(command, params, ctx)
    }
}

/// Middleware around command execution.
///
/// An interceptor may adjust parameters or context before calling
/// `next.execute`, adjust the result after, or return without calling `next`
/// at all, in which case nothing further down the chain runs. Errors should
/// be returned as they are; the chain adds no wrapping.
pub trait Interceptor: Send + Sync {
    fn intercept(
        &self,
        command: &CommandType,
        params: Parameters,
        ctx: &mut Context,
        next: &dyn Executor,
    ) -> Result<Value, DispatchError>;
}

impl<F> Interceptor for F
where
    F: Fn(&CommandType, Parameters, &mut Context, &dyn Executor) -> Result<Value, DispatchError> + Send + Sync,
{
    fn intercept(
        &self,
        command: &CommandType,
        params: Parameters,
        ctx: &mut Context,
        next: &dyn Executor,
    ) -> Result<Value, DispatchError> {
        self(command, params, ctx, next)
    }
}

struct Intercepted {
    interceptor: Arc<dyn Interceptor>,
    next: Arc<dyn Executor>,
}

impl Executor for Intercepted {
    fn execute(&self, command: &CommandType, params: Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        self.interceptor.intercept(command, params, ctx, self.next.as_ref())
    }
}

/// Compose `interceptors` around `terminal`; the first interceptor is outermost.
pub fn build_chain(interceptors: &[Arc<dyn Interceptor>], terminal: Arc<dyn Executor>) -> Arc<dyn Executor> {
    interceptors.iter().rev().fold(terminal, |next, interceptor| {
        Arc::new(Intercepted {
            interceptor: Arc::clone(interceptor),
            next,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchboard_core::ParameterSource;

    type Outcome = Result<Value, DispatchError>;

    #[derive(Debug, Default)]
    struct Noop;

    switchboard_core::bindable!(Noop {});

    impl crate::Command for Noop {
        const NAME: &'static str = "app.Noop";
        type Output = ();

        fn execute(self, _ctx: &mut Context) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn counting_terminal(count: Arc<AtomicUsize>) -> Arc<dyn Executor> {
        Arc::new(move |_: &CommandType, _: Parameters, _: &mut Context| -> Outcome {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from("ran"))
        })
    }

    fn recording(log: Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Arc<dyn Interceptor> {
        Arc::new(
            move |ct: &CommandType, params: Parameters, ctx: &mut Context, next: &dyn Executor| -> Outcome {
                log.lock().unwrap().push(label);
                let out = next.execute(ct, params, ctx);
                log.lock().unwrap().push(label);
                out
            },
        )
    }

    #[test]
    fn first_interceptor_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let count = Arc::new(AtomicUsize::new(0));
        let chain = build_chain(
            &[recording(Arc::clone(&log), "a"), recording(Arc::clone(&log), "b")],
            counting_terminal(Arc::clone(&count)),
        );

        let out = chain
            .execute(&CommandType::of::<Noop>(), Parameters::empty(), &mut Context::new())
            .unwrap();
        assert_eq!(out, Value::from("ran"));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "b", "a"]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interceptor_that_does_not_continue_prevents_execution() {
        let count = Arc::new(AtomicUsize::new(0));
        let stop: Arc<dyn Interceptor> = Arc::new(
            |_: &CommandType, _: Parameters, _: &mut Context, _: &dyn Executor| -> Outcome { Ok(Value::from("cached")) },
        );
        let chain = build_chain(&[stop], counting_terminal(Arc::clone(&count)));

        let out = chain
            .execute(&CommandType::of::<Noop>(), Parameters::empty(), &mut Context::new())
            .unwrap();
        assert_eq!(out, Value::from("cached"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn errors_propagate_unchanged() {
        let count = Arc::new(AtomicUsize::new(0));
        let fail: Arc<dyn Interceptor> = Arc::new(
            |_: &CommandType, _: Parameters, _: &mut Context, _: &dyn Executor| -> Outcome {
                Err(DispatchError::no_such_command("gone"))
            },
        );
        let chain = build_chain(&[fail], counting_terminal(Arc::clone(&count)));

        let err = chain
            .execute(&CommandType::of::<Noop>(), Parameters::empty(), &mut Context::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoSuchCommand(name) if name == "gone"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn interceptors_can_rewrite_parameters() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let terminal: Arc<dyn Executor> = Arc::new(
            move |_: &CommandType, params: Parameters, _: &mut Context| -> Outcome {
                *sink.lock().unwrap() = params.get("tenant");
                Ok(Value::Null)
            },
        );
        let inject: Arc<dyn Interceptor> = Arc::new(
            |ct: &CommandType, mut params: Parameters, ctx: &mut Context, next: &dyn Executor| -> Outcome {
                params.insert("tenant", "acme");
                next.execute(ct, params, ctx)
            },
        );

        build_chain(&[inject], terminal)
            .execute(&CommandType::of::<Noop>(), Parameters::empty(), &mut Context::new())
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(Value::from("acme")));
    }

    #[test]
    fn empty_chain_is_the_terminal() {
        let count = Arc::new(AtomicUsize::new(0));
        let chain = build_chain(&[], counting_terminal(Arc::clone(&count)));
        chain
            .execute(&CommandType::of::<Noop>(), Parameters::empty(), &mut Context::new())
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
