//! Named plugin table.
//!
//! Installing a plugin under a name that is already taken is a no-op that
//! hands back the existing instance.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Plugin '{name}' is registered with a different type")]
    TypeMismatch { name: String },

    #[error("Plugin registry lock poisoned")]
    LockPoisoned,
}

type PluginSlot = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Mutex<HashMap<String, PluginSlot>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the plugin built by `make` under `name`.
    ///
    /// `make` only runs when the name is free. The returned flag is `true`
    /// when this call created the instance.
    pub fn install<T, F>(&self, name: &str, make: F) -> Result<(Arc<T>, bool), RegistryError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut plugins = self.plugins.lock().map_err(|_| RegistryError::LockPoisoned)?;

        if let Some(existing) = plugins.get(name) {
            let existing = Arc::clone(existing)
                .downcast::<T>()
                .map_err(|_| RegistryError::TypeMismatch {
                    name: name.to_string(),
                })?;
            return Ok((existing, false));
        }

        let plugin = Arc::new(make());
        plugins.insert(name.to_string(), Arc::clone(&plugin) as PluginSlot);
        Ok((plugin, true))
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let plugins = self.plugins.lock().ok()?;
        Arc::clone(plugins.get(name)?).downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins
            .lock()
            .map(|plugins| plugins.contains_key(name))
            .unwrap_or(false)
    }
}
