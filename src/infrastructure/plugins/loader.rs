//! Plugin loader - Builds plugin instances from their manifest files

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use libloading::{Library, Symbol};
use crate::application::errors::PluginError;
use crate::plugins::{Plugin, PingPlugin, TemplatePlugin};
use super::manifest::{PluginKind, PluginManifest};

/// Constructor exported by native plugin libraries as `hotswap_plugin_init`.
///
/// Native plugins must be built with the same compiler as the host.
pub type PluginInitFn = unsafe fn() -> Box<dyn Plugin>;

const INIT_SYMBOL: &[u8] = b"hotswap_plugin_init";

/// Shared handle to a loaded plugin instance.
///
/// Every clone keeps the plugin's shared library mapped, so a handle taken
/// for a running command stays valid after the plugin is unloaded.
#[derive(Clone)]
pub struct PluginHandle {
    // Declared before `library` so the instance is dropped first
    instance: Arc<dyn Plugin>,
    #[allow(dead_code)]
    library: Option<Arc<Library>>,
}

impl PluginHandle {
    pub fn new(instance: Arc<dyn Plugin>, library: Option<Library>) -> Self {
        Self {
            instance,
            library: library.map(Arc::new),
        }
    }
}

impl Deref for PluginHandle {
    type Target = dyn Plugin;

    fn deref(&self) -> &Self::Target {
        self.instance.as_ref()
    }
}

/// Plugin loader
#[derive(Debug, Clone)]
pub struct PluginLoader {
    plugin_dir: PathBuf,
    extension: String,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            extension: extension.into(),
        }
    }

    /// Path of the file backing a plugin
    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(format!("{}.{}", name, self.extension))
    }

    pub fn read_manifest(&self, name: &str) -> Result<PluginManifest, PluginError> {
        PluginManifest::from_file(self.manifest_path(name))
    }

    /// Build and initialize a plugin from its file
    pub fn load_plugin(&self, name: &str) -> Result<PluginHandle, PluginError> {
        let manifest = self
            .read_manifest(name)
            .map_err(|e| PluginError::load(name, e))?;

        let (instance, library): (Arc<dyn Plugin>, Option<Library>) = match manifest.kind {
            PluginKind::Template => (Arc::new(TemplatePlugin::from_manifest(name, &manifest)), None),
            PluginKind::Ping => (Arc::new(PingPlugin::from_manifest(name, &manifest)), None),
            PluginKind::Native => {
                let (instance, library) = self.load_library(name, &manifest)?;
                (instance, Some(library))
            }
        };

        let handle = PluginHandle::new(instance, library);
        handle
            .init()
            .map_err(|e| PluginError::load(name, format!("init failed: {}", e)))?;

        tracing::info!(plugin = %name, kind = ?manifest.kind, "Built plugin");

        Ok(handle)
    }

    fn load_library(&self, name: &str, manifest: &PluginManifest) -> Result<(Arc<dyn Plugin>, Library), PluginError> {
        let library_path = manifest
            .library
            .as_ref()
            .map(|lib| self.plugin_dir.join(lib))
            .ok_or_else(|| PluginError::load(name, "missing library path"))?;

        if !library_path.exists() {
            return Err(PluginError::load(name, format!("library not found: {}", library_path.display())));
        }

        // Load the library
        let library = unsafe {
            Library::new(&library_path)
                .map_err(|e| PluginError::load(name, format!("failed to load library: {}", e)))?
        };

        // Get the init function and build the instance
        let instance: Box<dyn Plugin> = unsafe {
            let init_fn: Symbol<PluginInitFn> = library
                .get(INIT_SYMBOL)
                .map_err(|e| PluginError::load(name, format!("failed to find init function: {}", e)))?;
            init_fn()
        };

        Ok((Arc::from(instance), library))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CommandScope;
    use std::path::Path;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(format!("{}.yaml", name)), content).unwrap();
    }

    #[test]
    fn test_load_template_plugin() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "sus", "app-commands:\n  - name: sus\n    description: sus\n");

        let loader = PluginLoader::new(dir.path(), "yaml");
        let loaded = loader.load_plugin("sus").unwrap();

        assert_eq!(loaded.name(), "sus");
        assert_eq!(loaded.app_commands().scope, CommandScope::Global);
        assert_eq!(loaded.app_commands().commands.len(), 1);
        assert!(loaded.library.is_none());
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    #[test]
    fn test_clones_keep_library_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "sus", "prefix-commands:\n  - name: sus\n");
        let instance = PluginLoader::new(dir.path(), "yaml").load_plugin("sus").unwrap().instance;

        let library = unsafe { Library::new("libc.so.6") }.unwrap();
        let registered = PluginHandle::new(instance, Some(library));
        let in_flight = registered.clone();
        assert_eq!(Arc::strong_count(in_flight.library.as_ref().unwrap()), 2);

        // Unloading drops the registered handle; the in-flight one still owns the library
        drop(registered);
        assert_eq!(Arc::strong_count(in_flight.library.as_ref().unwrap()), 1);
        assert_eq!(in_flight.name(), "sus");
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PluginLoader::new(dir.path(), "yaml");
        assert!(matches!(loader.load_plugin("ghost"), Err(PluginError::Load { .. })));
    }

    #[test]
    fn test_missing_native_library_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "native", "kind: native\nlibrary: libnope.so\n");

        let loader = PluginLoader::new(dir.path(), "yaml");
        let err = loader.load_plugin("native").err().unwrap();
        assert!(err.to_string().contains("library not found"));
    }
}
