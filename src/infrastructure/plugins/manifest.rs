//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::PluginError;
use crate::domain::entities::CommandScope;

/// Contents of a plugin file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginManifest {
    /// Plugin description
    pub description: Option<String>,

    /// How the plugin is built
    pub kind: PluginKind,

    /// Path to the shared library, for native plugins
    pub library: Option<PathBuf>,

    /// Register app commands in this chat only instead of globally
    pub target_group: Option<i64>,

    /// Local text-prefix commands
    pub prefix_commands: Vec<CommandEntry>,

    /// Declarative commands published to the remote registry
    pub app_commands: Vec<CommandEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    /// Replies rendered from the manifest
    #[default]
    Template,
    /// Latency report
    Ping,
    /// Shared library exposing `hotswap_plugin_init`
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PluginError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Manifest(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
            .map_err(|e| PluginError::Manifest(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        // An empty file is a plugin with no commands
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let manifest: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), String> {
        if self.kind == PluginKind::Native && self.library.is_none() {
            return Err("native plugins need a `library` path".to_string());
        }
        Ok(())
    }

    /// Scope the plugin's app commands are registered in
    pub fn scope(&self) -> CommandScope {
        CommandScope::from_hint(self.target_group)
    }
}
