//! Local plugin host - Runs plugins in-process

use async_trait::async_trait;

use crate::application::errors::{CommandError, PluginError};
use crate::domain::entities::{
    CommandScope, CommandSpec, DeclaredCommands, Invocation, InvocationKind, SharedCommandTree,
};
use crate::domain::traits::PluginHost;
use super::loader::{PluginHandle, PluginLoader};
use super::registry::PluginRegistry;

/// In-process plugin host backed by a plugin directory
pub struct LocalPluginHost {
    loader: PluginLoader,
    registry: PluginRegistry,
    tree: SharedCommandTree,
}

impl LocalPluginHost {
    pub fn new(loader: PluginLoader, tree: SharedCommandTree) -> Self {
        Self {
            loader,
            registry: PluginRegistry::new(),
            tree,
        }
    }

    pub fn tree(&self) -> &SharedCommandTree {
        &self.tree
    }

    /// Read, build and init a plugin off the async runtime
    async fn build(&self, name: &str) -> Result<PluginHandle, PluginError> {
        let loader = self.loader.clone();
        let owned = name.to_string();
        tokio::task::spawn_blocking(move || loader.load_plugin(&owned))
            .await
            .map_err(|e| PluginError::load(name, e))?
    }

    fn shutdown(name: &str, plugin: PluginHandle) -> Result<(), PluginError> {
        plugin
            .shutdown()
            .map_err(|e| PluginError::unload(name, e))
    }
}

#[async_trait]
impl PluginHost for LocalPluginHost {
    async fn load(&self, name: &str) -> Result<(), PluginError> {
        if self.registry.is_loaded(name) {
            return Err(PluginError::load(name, "already loaded"));
        }

        let plugin = self.build(name).await?;
        self.registry.register(name, plugin)?;
        tracing::info!(plugin = %name, "Loaded plugin");
        Ok(())
    }

    async fn unload(&self, name: &str) -> Result<(), PluginError> {
        let plugin = self.registry.remove(name)?;
        Self::shutdown(name, plugin)?;
        tracing::info!(plugin = %name, "Unloaded plugin");
        Ok(())
    }

    async fn reload(&self, name: &str) -> Result<(), PluginError> {
        match self.build(name).await {
            Ok(plugin) => {
                if let Some(old) = self.registry.replace(name, plugin)? {
                    if let Err(e) = Self::shutdown(name, old) {
                        tracing::warn!(plugin = %name, error = %e, "Old instance failed to shut down");
                    }
                }
                tracing::info!(plugin = %name, "Reloaded plugin");
                Ok(())
            }
            Err(e) => {
                // The old instance does not survive a failed reload
                if let Ok(old) = self.registry.remove(name) {
                    if let Err(e) = Self::shutdown(name, old) {
                        tracing::warn!(plugin = %name, error = %e, "Old instance failed to shut down");
                    }
                }
                Err(e)
            }
        }
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.registry.is_loaded(name)
    }

    fn declared_commands(&self, name: &str) -> DeclaredCommands {
        self.registry
            .get(name)
            .map(|p| p.app_commands())
            .unwrap_or_default()
    }

    fn add_command(&self, owner: &str, spec: CommandSpec, scope: CommandScope) -> Result<(), PluginError> {
        let mut tree = self.tree.write()
            .map_err(|_| PluginError::registration(&spec.name, scope, "command tree lock poisoned"))?;
        tree.add(owner, spec, scope)
    }

    fn remove_command(&self, name: &str, scope: CommandScope) -> Result<(), PluginError> {
        let mut tree = self.tree.write()
            .map_err(|_| PluginError::registration(name, scope, "command tree lock poisoned"))?;
        tree.remove(name, scope).map(|_| ())
    }

    /// `/name` resolves through the command tree, `<prefix>name` through
    /// the loaded plugins' prefix commands
    fn execute(&self, invocation: &Invocation) -> Result<Option<String>, CommandError> {
        let plugin = match invocation.kind {
            InvocationKind::App => {
                let owner = {
                    let tree = self.tree.read()
                        .map_err(|_| CommandError::ExecutionFailed("command tree lock poisoned".to_string()))?;
                    let chat = invocation.chat_id.parse::<i64>().ok();
                    tree.resolve(&invocation.command, chat).map(|entry| entry.owner.clone())
                };
                match owner {
                    Some(owner) => Some(self.registry.get(&owner).ok_or_else(|| {
                        CommandError::ExecutionFailed(format!("plugin '{}' is not loaded", owner))
                    })?),
                    None => None,
                }
            }
            InvocationKind::Prefix => self.registry.find_prefix(&invocation.command),
        };

        match plugin {
            Some(plugin) => plugin.execute(invocation).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::create_command_tree;

    fn host_with(files: &[(&str, &str)]) -> (tempfile::TempDir, LocalPluginHost) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(format!("{}.yaml", name)), content).unwrap();
        }
        let host = LocalPluginHost::new(PluginLoader::new(dir.path(), "yaml"), create_command_tree());
        (dir, host)
    }

    const SUS: &str = r#"
prefix-commands:
  - name: sus
    reply: "{text}"
app-commands:
  - name: sus
    description: sus
    reply: "e {text}"
"#;

    #[tokio::test]
    async fn test_load_twice_fails() {
        let (_dir, host) = host_with(&[("sus", SUS)]);
        host.load("sus").await.unwrap();
        assert!(host.is_loaded("sus"));
        assert!(matches!(host.load("sus").await, Err(PluginError::Load { .. })));
    }

    #[tokio::test]
    async fn test_unload_unknown_is_not_found() {
        let (_dir, host) = host_with(&[]);
        assert!(matches!(host.unload("ghost").await, Err(PluginError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_reload_leaves_plugin_unloaded() {
        let (dir, host) = host_with(&[("sus", SUS)]);
        host.load("sus").await.unwrap();

        std::fs::write(dir.path().join("sus.yaml"), "kind: [broken").unwrap();
        assert!(host.reload("sus").await.is_err());
        assert!(!host.is_loaded("sus"));
    }

    #[tokio::test]
    async fn test_execute_routes_by_trigger() {
        let (_dir, host) = host_with(&[("sus", SUS)]);
        host.load("sus").await.unwrap();

        let app = Invocation::new("sus", vec!["hi".to_string()], InvocationKind::App);
        let prefix = Invocation::new("sus", vec!["hi".to_string()], InvocationKind::Prefix);

        // Not in the tree yet: `/sus` reaches nothing
        assert_eq!(host.execute(&app).unwrap(), None);
        assert_eq!(host.execute(&prefix).unwrap().as_deref(), Some("hi"));

        let declared = host.declared_commands("sus");
        for spec in declared.commands {
            host.add_command("sus", spec, declared.scope).unwrap();
        }
        assert_eq!(host.execute(&app).unwrap().as_deref(), Some("e hi"));
        assert_eq!(host.execute(&prefix).unwrap().as_deref(), Some("hi"));

        let unknown = Invocation::new("nope", vec![], InvocationKind::Prefix);
        assert_eq!(host.execute(&unknown).unwrap(), None);
    }

    #[tokio::test]
    async fn test_handle_outlives_unload() {
        let (_dir, host) = host_with(&[("sus", SUS)]);
        host.load("sus").await.unwrap();

        let in_flight = host.registry.get("sus").unwrap();
        host.unload("sus").await.unwrap();
        assert!(!host.is_loaded("sus"));

        let call = Invocation::new("sus", vec!["still".to_string(), "here".to_string()], InvocationKind::Prefix);
        assert_eq!(in_flight.execute(&call).unwrap(), "still here");
    }
}
