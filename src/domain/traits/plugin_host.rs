use async_trait::async_trait;

use crate::application::errors::{CommandError, PluginError};
use crate::domain::entities::{CommandScope, CommandSpec, DeclaredCommands, Invocation};

/// Capability to run plugin modules and edit the live command tree
///
/// The lifecycle controller drives plugins exclusively through this trait.
/// `load`, `unload` and `reload` may suspend; command-tree edits never do.
#[async_trait]
pub trait PluginHost: Send + Sync {
    async fn load(&self, name: &str) -> Result<(), PluginError>;

    async fn unload(&self, name: &str) -> Result<(), PluginError>;

    /// Replace a loaded plugin with a fresh instance.
    ///
    /// Hosts without a native reload get unload followed by load.
    async fn reload(&self, name: &str) -> Result<(), PluginError> {
        if let Err(e) = self.unload(name).await {
            tracing::warn!(plugin = %name, error = %e, "Unload before reload failed");
        }
        self.load(name).await
    }

    fn is_loaded(&self, name: &str) -> bool;

    /// Declarative commands of a loaded plugin; empty when it declares none
    fn declared_commands(&self, name: &str) -> DeclaredCommands;

    fn add_command(&self, owner: &str, spec: CommandSpec, scope: CommandScope) -> Result<(), PluginError>;

    fn remove_command(&self, name: &str, scope: CommandScope) -> Result<(), PluginError>;

    /// Run a command; `Ok(None)` when no loaded plugin handles it
    fn execute(&self, invocation: &Invocation) -> Result<Option<String>, CommandError>;
}
