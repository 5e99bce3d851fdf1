//! Commands and their type-erased descriptors.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use switchboard_auth::Access;
use switchboard_core::{Bindable, Context, ParameterBinder, ParameterSchema, Value};

use crate::error::DispatchError;
use crate::params::Parameters;

/// A named unit of business logic with declared parameters.
///
/// Parameters are declared through [`Bindable`] (usually the
/// [`bindable!`](switchboard_core::bindable) macro). A fresh instance is
/// produced for every dispatch, bound, then consumed by [`execute`](Command::execute).
pub trait Command: Bindable + Sized {
    /// Fully qualified name, e.g. `app.users.Create`.
    const NAME: &'static str;

    /// Access classifiers; exactly one is expected when access control is on.
    const ACCESS: &'static [Access] = &[];

    type Output: Serialize;

    fn execute(self, ctx: &mut Context) -> anyhow::Result<Self::Output>;
}

type Invoker = dyn Fn(&ParameterBinder, &Parameters, &mut Context) -> Result<Value, DispatchError> + Send + Sync;

/// Type-erased handle to a registered command type.
///
/// Cheap to clone. Carries everything the pipeline needs without knowing the
/// concrete type: name, identity, access classifiers, schema and an invoker
/// that instantiates, binds and executes.
#[derive(Clone)]
pub struct CommandType {
    name: &'static str,
    type_id: TypeId,
    access: &'static [Access],
    schema: fn(&ParameterBinder) -> Arc<ParameterSchema>,
    invoker: Arc<Invoker>,
}

impl CommandType {
    /// Descriptor instantiating `C` with `Default`.
    pub fn of<C: Command + Default>() -> Self {
        Self::with_factory::<C, _>(C::default)
    }

    /// Descriptor instantiating `C` with `factory`.
    pub fn with_factory<C, F>(factory: F) -> Self
    where
        C: Command,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let invoker = move |binder: &ParameterBinder, params: &Parameters, ctx: &mut Context| -> Result<Value, DispatchError> {
            let mut command = factory();
            params
                .bind_into(&mut command, binder)
                .map_err(|e| e.for_command(C::NAME))?;
            let output = command
                .execute(ctx)
                .map_err(|e| DispatchError::from_command(C::NAME, e))?;
            Value::from_serialize(&output).map_err(|e| DispatchError::Execution {
                command: C::NAME.to_string(),
                source: anyhow::Error::new(e).context("serializing command output"),
            })
        };

        Self {
            name: C::NAME,
            type_id: TypeId::of::<C>(),
            access: C::ACCESS,
            schema: |binder| binder.schema::<C>(),
            invoker: Arc::new(invoker),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn access(&self) -> &'static [Access] {
        self.access
    }

    pub fn schema(&self, binder: &ParameterBinder) -> Arc<ParameterSchema> {
        (self.schema)(binder)
    }

    /// Instantiate, bind and execute.
    pub fn invoke(&self, binder: &ParameterBinder, params: &Parameters, ctx: &mut Context) -> Result<Value, DispatchError> {
        (self.invoker)(binder, params, ctx)
    }

    pub fn is<C: Command>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }
}

impl fmt::Debug for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandType")
            .field("name", &self.name)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, Default)]
    struct Greet {
        name: String,
        greeting: String,
    }

    switchboard_core::bindable!(Greet {
        required name: String,
        optional greeting: String,
    });

    impl Command for Greet {
        const NAME: &'static str = "app.Greet";
        const ACCESS: &'static [Access] = &[Access::Public];
        type Output = String;

        fn execute(self, _ctx: &mut Context) -> anyhow::Result<String> {
            Ok(format!("{}, {}", self.greeting, self.name))
        }
    }

    #[test]
    fn factory_supplies_defaults_before_binding() {
        let ct = CommandType::with_factory(|| Greet {
            greeting: "Hello".to_string(),
            ..Default::default()
        });
        let binder = ParameterBinder::default();

        let out = ct
            .invoke(&binder, &Parameters::empty().with("name", "ada"), &mut Context::new())
            .unwrap();
        assert_eq!(out, Value::from("Hello, ada"));

        let err = ct
            .invoke(&binder, &Parameters::empty(), &mut Context::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert!(err.to_string().contains("app.Greet"));
    }

    #[test]
    fn descriptor_exposes_schema() {
        let ct = CommandType::of::<Greet>();
        let schema = ct.schema(&ParameterBinder::default());
        assert!(ct.is::<Greet>());
        assert_eq!(schema.required().map(|p| p.name()).collect::<Vec<_>>(), vec!["name"]);
    }
}
