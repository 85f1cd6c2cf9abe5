//! Plugin registry - Holds the currently loaded plugins

use std::collections::BTreeMap;
use std::sync::RwLock;
use crate::application::errors::PluginError;
use super::loader::PluginHandle;

/// Registry of loaded plugins, keyed by plugin name
pub struct PluginRegistry {
    plugins: RwLock<BTreeMap<String, PluginHandle>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a loaded plugin under a name that is not taken yet
    pub fn register(&self, name: &str, plugin: PluginHandle) -> Result<(), PluginError> {
        let mut plugins = self.plugins.write()
            .map_err(|_| PluginError::load(name, "registry lock poisoned"))?;

        if plugins.contains_key(name) {
            return Err(PluginError::load(name, "already loaded"));
        }

        plugins.insert(name.to_string(), plugin);
        Ok(())
    }

    /// Swap in a new instance, returning the one it replaced
    pub fn replace(&self, name: &str, plugin: PluginHandle) -> Result<Option<PluginHandle>, PluginError> {
        let mut plugins = self.plugins.write()
            .map_err(|_| PluginError::load(name, "registry lock poisoned"))?;
        Ok(plugins.insert(name.to_string(), plugin))
    }

    /// Remove a plugin
    pub fn remove(&self, name: &str) -> Result<PluginHandle, PluginError> {
        let mut plugins = self.plugins.write()
            .map_err(|_| PluginError::unload(name, "registry lock poisoned"))?;

        plugins.remove(name).ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<PluginHandle> {
        self.plugins.read()
            .ok()?
            .get(name)
            .cloned()
    }

    /// First loaded plugin (by name) handling a text-prefix command
    pub fn find_prefix(&self, command: &str) -> Option<PluginHandle> {
        self.plugins.read()
            .ok()?
            .values()
            .find(|p| p.prefix_commands().iter().any(|c| c == command))
            .cloned()
    }

    /// Check if a plugin is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins.read()
            .ok()
            .map(|p| p.contains_key(name))
            .unwrap_or(false)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
