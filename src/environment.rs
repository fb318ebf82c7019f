//! Variable store.
//!
//! One flat mapping for the whole run: no nested scopes and no shadowing.
//! Assignment is the only writer and identifier lookup the only reader.

use crate::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding of `name`, if it has ever been assigned.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind `name` to `value`, replacing any earlier binding regardless of its type.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::trace!(%name, %value, "bind");
        self.vars.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bindings sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let mut entries: Vec<_> = self.vars.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}
