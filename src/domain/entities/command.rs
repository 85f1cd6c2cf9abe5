use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::application::errors::PluginError;

/// Bot-command names accepted by the remote registry
static COMMAND_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]{1,32}$").unwrap());

const MAX_DESCRIPTION_LEN: usize = 256;

/// Breadth of a command registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandScope {
    /// Visible in every chat
    Global,
    /// Visible in a single chat/group only
    Group(i64),
}

impl CommandScope {
    pub fn from_hint(group: Option<i64>) -> Self {
        group.map(CommandScope::Group).unwrap_or(CommandScope::Global)
    }
}

impl Default for CommandScope {
    fn default() -> Self {
        CommandScope::Global
    }
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Global => write!(f, "global"),
            CommandScope::Group(id) => write!(f, "group:{}", id),
        }
    }
}

/// A declarative command as published to the remote registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Check the name and description against the registry's limits
    pub fn validate(&self, scope: CommandScope) -> Result<(), PluginError> {
        if !COMMAND_NAME.is_match(&self.name) {
            return Err(PluginError::registration(
                &self.name,
                scope,
                "name must be 1-32 characters of a-z, 0-9 or _",
            ));
        }
        let len = self.description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LEN {
            return Err(PluginError::registration(
                &self.name,
                scope,
                format!("description must be 1-{} characters", MAX_DESCRIPTION_LEN),
            ));
        }
        Ok(())
    }
}

/// Commands a plugin wants registered, and where
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredCommands {
    pub scope: CommandScope,
    pub commands: Vec<CommandSpec>,
}

impl DeclaredCommands {
    pub fn new(scope: CommandScope, commands: Vec<CommandSpec>) -> Self {
        Self { scope, commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One (command, scope) pair added on behalf of a plugin
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandRegistration {
    pub command: String,
    pub scope: CommandScope,
}

impl CommandRegistration {
    pub fn new(command: impl Into<String>, scope: CommandScope) -> Self {
        Self {
            command: command.into(),
            scope,
        }
    }
}

impl fmt::Display for CommandRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{} ({})", self.command, self.scope)
    }
}

/// Entry of the live command tree
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub spec: CommandSpec,
    pub owner: String,
}

/// Live tree of declarative commands, keyed by (scope, name)
#[derive(Debug, Default)]
pub struct CommandTree {
    commands: BTreeMap<(CommandScope, String), TreeEntry>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; an existing (name, scope) entry is never overwritten
    pub fn add(&mut self, owner: &str, spec: CommandSpec, scope: CommandScope) -> Result<(), PluginError> {
        spec.validate(scope)?;

        let key = (scope, spec.name.clone());
        if let Some(existing) = self.commands.get(&key) {
            return Err(PluginError::registration(
                &spec.name,
                scope,
                format!("already registered by plugin '{}'", existing.owner),
            ));
        }

        self.commands.insert(
            key,
            TreeEntry {
                spec,
                owner: owner.to_string(),
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, name: &str, scope: CommandScope) -> Result<TreeEntry, PluginError> {
        self.commands
            .remove(&(scope, name.to_string()))
            .ok_or_else(|| PluginError::registration(name, scope, "not registered"))
    }

    pub fn get(&self, name: &str, scope: CommandScope) -> Option<&TreeEntry> {
        self.commands.get(&(scope, name.to_string()))
    }

    /// Find the command a chat sees: its own group scope first, then global
    pub fn resolve(&self, name: &str, chat_id: Option<i64>) -> Option<&TreeEntry> {
        chat_id
            .and_then(|id| self.get(name, CommandScope::Group(id)))
            .or_else(|| self.get(name, CommandScope::Global))
    }

    /// Full set published for a scope, sorted by name
    pub fn commands_in(&self, scope: CommandScope) -> Vec<CommandSpec> {
        self.commands
            .iter()
            .filter(|((s, _), _)| *s == scope)
            .map(|(_, entry)| entry.spec.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Command tree shared by the message loop and the plugin watcher
pub type SharedCommandTree = Arc<RwLock<CommandTree>>;

/// Create a new, empty shared command tree
pub fn create_command_tree() -> SharedCommandTree {
    Arc::new(RwLock::new(CommandTree::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicate_in_same_scope() {
        let mut tree = CommandTree::new();
        tree.add("alpha", CommandSpec::new("sus", "sus"), CommandScope::Global).unwrap();

        let err = tree
            .add("beta", CommandSpec::new("sus", "other"), CommandScope::Global)
            .unwrap_err();
        assert!(err.to_string().contains("already registered by plugin 'alpha'"));
        assert_eq!(tree.get("sus", CommandScope::Global).unwrap().owner, "alpha");
    }

    #[test]
    fn test_same_name_in_different_scopes() {
        let mut tree = CommandTree::new();
        tree.add("alpha", CommandSpec::new("sus", "sus"), CommandScope::Global).unwrap();
        tree.add("beta", CommandSpec::new("sus", "sus"), CommandScope::Group(-100)).unwrap();

        assert_eq!(tree.resolve("sus", Some(-100)).unwrap().owner, "beta");
        assert_eq!(tree.resolve("sus", Some(42)).unwrap().owner, "alpha");
        assert_eq!(tree.resolve("sus", None).unwrap().owner, "alpha");
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut tree = CommandTree::new();
        let long = "x".repeat(33);
        for name in ["", "Upper", "with space", "a-b", long.as_str()] {
            assert!(tree.add("p", CommandSpec::new(name, "desc"), CommandScope::Global).is_err());
        }
        assert!(tree.add("p", CommandSpec::new("ok", ""), CommandScope::Global).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_missing_is_error() {
        let mut tree = CommandTree::new();
        assert!(tree.remove("ghost", CommandScope::Global).is_err());
    }

    #[test]
    fn test_commands_in_scope_is_sorted() {
        let mut tree = CommandTree::new();
        tree.add("p", CommandSpec::new("zeta", "z"), CommandScope::Global).unwrap();
        tree.add("p", CommandSpec::new("alpha", "a"), CommandScope::Global).unwrap();
        tree.add("p", CommandSpec::new("mid", "m"), CommandScope::Group(7)).unwrap();

        let names: Vec<_> = tree
            .commands_in(CommandScope::Global)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(tree.commands_in(CommandScope::Group(7)).len(), 1);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(CommandScope::Global.to_string(), "global");
        assert_eq!(CommandScope::Group(-5).to_string(), "group:-5");
        assert_eq!(CommandScope::from_hint(None), CommandScope::Global);
    }
}
