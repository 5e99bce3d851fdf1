use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value as JsonValue};

use switchboard_core::{Bindable, BindingError, OwnedPrototype, ParameterBinder, ParameterSource, Value};

enum Source {
    Empty,
    Map(BTreeMap<String, Value>),
    Prototype(Box<dyn ParameterSource + Send>),
}

/// Parameters of one dispatch.
///
/// Either a flat name → value map or a prototype instance whose declared
/// fields are copied into the fresh command. Interceptors may layer values
/// on top with [`insert`](Parameters::insert) and [`remove`](Parameters::remove);
/// the layer wins over the underlying source.
pub struct Parameters {
    source: Source,
    overrides: BTreeMap<String, Value>,
}

impl Parameters {
    pub fn empty() -> Self {
        Self {
            source: Source::Empty,
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_map(values: BTreeMap<String, Value>) -> Self {
        Self {
            source: Source::Map(values),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_json(values: Map<String, JsonValue>) -> Self {
        Self::from_map(values.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }

    /// Bind from the declared fields of `prototype`.
    pub fn prototype<B: Bindable>(prototype: B) -> Self {
        Self {
            source: Source::Prototype(Box::new(OwnedPrototype::new(prototype))),
            overrides: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    /// Hide a value of the underlying source.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.overrides.insert(name.to_string(), Value::Null);
        self
    }

    pub fn is_prototype(&self) -> bool {
        matches!(self.source, Source::Prototype(_))
    }

    pub(crate) fn bind_into<B: Bindable>(&self, target: &mut B, binder: &ParameterBinder) -> Result<(), BindingError> {
        binder.bind(target, self)
    }
}

impl ParameterSource for Parameters {
    fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.overrides.get(name) {
            return (!value.is_null()).then(|| value.clone());
        }
        match &self.source {
            Source::Empty => None,
            Source::Map(values) => ParameterSource::get(values, name),
            Source::Prototype(prototype) => prototype.get(name),
        }
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<BTreeMap<String, Value>> for Parameters {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self::from_map(values)
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Empty => "empty",
            Source::Map(_) => "map",
            Source::Prototype(_) => "prototype",
        };
        f.debug_struct("Parameters")
            .field("source", &source)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}
