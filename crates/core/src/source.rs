//! Where a named parameter's value comes from.

use std::collections::{BTreeMap, HashMap};

use crate::schema::Bindable;
use crate::value::Value;

/// Read access to raw parameter values by name.
///
/// Values are returned owned; a source never lends out its storage, so a
/// bound command can never alias the data it was bound from. `Null` counts as
/// absent.
pub trait ParameterSource {
    fn get(&self, name: &str) -> Option<Value>;
}

impl ParameterSource for BTreeMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        BTreeMap::get(self, name).filter(|v| !v.is_null()).cloned()
    }
}

impl ParameterSource for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).filter(|v| !v.is_null()).cloned()
    }
}

impl<S: ParameterSource + ?Sized> ParameterSource for &S {
    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }
}

impl<S: ParameterSource + ?Sized> ParameterSource for Box<S> {
    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }
}

/// A source with no values at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoParameters;

impl ParameterSource for NoParameters {
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Reads the declared parameter fields of an existing instance.
///
/// Only parameter values are read, by value; whatever else the prototype holds
/// stays behind.
#[derive(Debug)]
pub struct PrototypeSource<'a, B> {
    prototype: &'a B,
}

impl<'a, B: Bindable> PrototypeSource<'a, B> {
    pub fn new(prototype: &'a B) -> Self {
        Self { prototype }
    }
}

impl<B: Bindable> ParameterSource for PrototypeSource<'_, B> {
    fn get(&self, name: &str) -> Option<Value> {
        self.prototype.read(name).filter(|v| !v.is_null())
    }
}

/// Owned variant of [`PrototypeSource`], for handing a prototype across a
/// type-erased boundary.
#[derive(Debug, Clone)]
pub struct OwnedPrototype<B> {
    prototype: B,
}

impl<B: Bindable> OwnedPrototype<B> {
    pub fn new(prototype: B) -> Self {
        Self { prototype }
    }

    pub fn into_inner(self) -> B {
        self.prototype
    }
}

impl<B: Bindable> ParameterSource for OwnedPrototype<B> {
    fn get(&self, name: &str) -> Option<Value> {
        self.prototype.read(name).filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_entries_read_as_absent() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::Null);
        map.insert("b".to_string(), Value::Long(1));

        assert_eq!(ParameterSource::get(&map, "a"), None);
        assert_eq!(ParameterSource::get(&map, "b"), Some(Value::Long(1)));
        assert_eq!(ParameterSource::get(&map, "c"), None);
        assert_eq!(NoParameters.get("b"), None);
    }
}
