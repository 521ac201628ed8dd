//! Storage for live configuration values, keyed by [`Scope`].

use crate::command::Scope;
use crate::value::{ConfigValue, DisplayTerm};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Where patched configuration is read from and written back to.
pub trait ConfigStore {
    fn get(&self, scope: &Scope) -> Option<ConfigValue>;
    fn set(&mut self, scope: &Scope, value: ConfigValue);
    fn unset(&mut self, scope: &Scope);
}

#[derive(Debug, Error)]
pub enum StoreLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid base configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a mapping of parameters under {0}")]
    NotAMapping(String),
}

/// In-memory store that remembers the order scopes were first written in.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<Scope, ConfigValue>,
    order: Vec<Scope>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a base configuration shaped as `app: { param: value }`.
    pub fn from_yaml_str(content: &str) -> Result<Self, StoreLoadError> {
        let mut store = Self::new();
        if content.trim().is_empty() {
            return Ok(store);
        }
        let apps = match serde_yaml::from_str::<Value>(content)? {
            Value::Null => return Ok(store),
            Value::Mapping(apps) => apps,
            other => {
                return Err(StoreLoadError::NotAMapping(format!(
                    "the document root, found {}",
                    DisplayTerm(&other)
                )));
            }
        };
        for (app, params) in apps {
            let params = match params {
                Value::Mapping(params) => params,
                Value::Null => Mapping::new(),
                _ => return Err(StoreLoadError::NotAMapping(DisplayTerm(&app).to_string())),
            };
            for (param, value) in params {
                store.set(&Scope::new(app.clone(), param), ConfigValue::from_yaml(value));
            }
        }
        Ok(store)
    }

    /// Load a base configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Scopes with their values, in first-write order.
    pub fn iter(&self) -> impl Iterator<Item = (&Scope, &ConfigValue)> {
        self.order
            .iter()
            .filter_map(|scope| self.values.get(scope).map(|value| (scope, value)))
    }

    /// Dump back to the `app: { param: value }` shape.
    pub fn to_yaml(&self) -> Value {
        let mut apps = Mapping::new();
        for (scope, value) in self.iter() {
            if !apps.contains_key(&scope.app) {
                apps.insert(scope.app.clone(), Value::Mapping(Mapping::new()));
            }
            if let Some(Value::Mapping(params)) = apps.get_mut(&scope.app) {
                params.insert(scope.param.clone(), value.clone().into_yaml());
            }
        }
        Value::Mapping(apps)
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, scope: &Scope) -> Option<ConfigValue> {
        self.values.get(scope).cloned()
    }

    fn set(&mut self, scope: &Scope, value: ConfigValue) {
        if self.values.insert(scope.clone(), value).is_none() {
            self.order.push(scope.clone());
        }
    }

    fn unset(&mut self, scope: &Scope) {
        if self.values.remove(scope).is_some() {
            self.order.retain(|s| s != scope);
        }
    }
}
