use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::config::Config;
use crate::value::Value;

/// The symbol table: one flat namespace shared by every construct.
///
/// There is no scoping. Function parameters, loop variables and `set` all write
/// here, and the last write to a name wins everywhere, including inside
/// functions defined earlier that mention the name.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: HashMap::new(),
        }
    }

    /// An environment seeded with the host binding, if the config has a host.
    pub fn with_config(config: &Config) -> Self {
        let mut env = Environment::new();
        if let Some(host) = &config.host {
            env.set(config.host_binding.clone(), Value::Native(Rc::clone(host)));
        }
        env
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    /// Bind `name`, replacing whatever it held before.
    pub fn set(&mut self, name: String, value: Value) {
        trace!(%name, value = %value.to_code_string(), "bind");
        self.store.insert(name, value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.store.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All bindings ordered by name
    pub fn bindings(&self) -> Vec<(&str, &Value)> {
        let mut bindings: Vec<(&str, &Value)> = self
            .store
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }
}
