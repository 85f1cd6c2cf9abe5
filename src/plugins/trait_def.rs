//! Plugin trait definitions

use crate::application::errors::{CommandError, PluginError};
use crate::domain::entities::{DeclaredCommands, Invocation};

/// Core plugin trait that all plugins must implement
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Called once after the plugin is constructed, before any command runs
    fn init(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the plugin is unloaded or replaced
    fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Declarative commands this plugin wants in the remote registry.
    ///
    /// Plugins without any keep the default, an empty global set.
    fn app_commands(&self) -> DeclaredCommands {
        DeclaredCommands::default()
    }

    /// Text-prefix commands handled locally and never published
    fn prefix_commands(&self) -> Vec<String> {
        Vec::new()
    }

    /// Execute one of this plugin's commands
    fn execute(&self, invocation: &Invocation) -> Result<String, CommandError>;
}
