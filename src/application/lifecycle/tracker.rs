//! Command registration tracker - What this host added to the command tree

use std::collections::{BTreeSet, HashMap};

use crate::domain::entities::{CommandRegistration, CommandScope};

/// Plugin name -> commands registered on its behalf, in registration order.
///
/// The remote registry does not say who registered a command, so this is
/// the only record of ownership used for cleanup.
#[derive(Debug, Default)]
pub struct CommandRegistrationTracker {
    entries: HashMap<String, Vec<CommandRegistration>>,
}

impl CommandRegistrationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, plugin: &str, command: impl Into<String>, scope: CommandScope) {
        let registration = CommandRegistration::new(command, scope);
        let entries = self.entries.entry(plugin.to_string()).or_default();
        if !entries.contains(&registration) {
            entries.push(registration);
        }
    }

    pub fn entries_for(&self, plugin: &str) -> &[CommandRegistration] {
        self.entries.get(plugin).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop and return everything recorded for a plugin
    pub fn clear(&mut self, plugin: &str) -> Vec<CommandRegistration> {
        self.entries.remove(plugin).unwrap_or_default()
    }

    /// Scopes a plugin currently has commands in
    pub fn scopes_for(&self, plugin: &str) -> BTreeSet<CommandScope> {
        self.entries_for(plugin).iter().map(|r| r.scope).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
