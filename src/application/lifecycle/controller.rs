//! Lifecycle controller - Load, reload and unload transitions for one plugin

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{error, info, warn};

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandScope, PluginRecord, PluginState};
use crate::domain::traits::PluginHost;
use super::sync::RemoteRegistrySyncClient;
use super::tracker::CommandRegistrationTracker;

/// Drives plugin transitions against a [`PluginHost`].
///
/// Transitions take `&mut self`, so two of them can never overlap. Each one
/// unregisters old commands, (re)loads or unloads the module, registers the
/// new commands and then publishes every scope it touched exactly once.
///
/// Failure policy:
/// - load rolls back every command it added and leaves the plugin unloaded
/// - unload is best effort: a command that cannot be removed is logged and
///   the rest are still removed
/// - a failed sync is logged and never reverts the transition
pub struct LifecycleController {
    host: Arc<dyn PluginHost>,
    sync: RemoteRegistrySyncClient,
    tracker: CommandRegistrationTracker,
    records: BTreeMap<String, PluginRecord>,
}

impl LifecycleController {
    pub fn new(host: Arc<dyn PluginHost>, sync: RemoteRegistrySyncClient) -> Self {
        Self {
            host,
            sync,
            tracker: CommandRegistrationTracker::new(),
            records: BTreeMap::new(),
        }
    }

    pub fn record(&self, name: &str) -> Option<&PluginRecord> {
        self.records.get(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &PluginRecord> {
        self.records.values()
    }

    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.records.get(name).map(|r| r.state)
    }

    pub fn tracker(&self) -> &CommandRegistrationTracker {
        &self.tracker
    }

    /// Modification times of every plugin file seen so far
    pub fn observed(&self) -> BTreeMap<String, SystemTime> {
        self.records
            .iter()
            .map(|(name, record)| (name.clone(), record.modified))
            .collect()
    }

    /// Unloaded --load--> Loaded
    pub async fn load(&mut self, name: &str, modified: SystemTime) -> Result<(), PluginError> {
        let already_loaded = self.observe(name, modified).is_loaded() || self.host.is_loaded(name);
        if already_loaded {
            warn!(plugin = %name, "Plugin already loaded, reloading instead");
            return self.reload(name, modified).await;
        }
        self.load_fresh(name, BTreeSet::new()).await
    }

    /// Loaded --reload--> Loaded, or a plain load if the host never had it
    pub async fn reload(&mut self, name: &str, modified: SystemTime) -> Result<(), PluginError> {
        self.observe(name, modified);

        if !self.host.is_loaded(name) {
            info!(plugin = %name, "Plugin not loaded yet, loading");
            let removed = self.unregister_all(name);
            return self.load_fresh(name, removed).await;
        }

        let removed = self.unregister_all(name);
        let result = match self.host.reload(name).await {
            Ok(()) => self.register_declared(name).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(added) => {
                self.set_state(name, PluginState::Loaded);
                info!(plugin = %name, commands = self.tracker.entries_for(name).len(), "Reloaded plugin");
                self.sync_scopes(removed.union(&added).copied().collect()).await;
                Ok(())
            }
            Err(e) => {
                self.set_state(name, PluginState::Unloaded);
                error!(plugin = %name, error = %e, "Failed to reload plugin");
                self.sync_scopes(removed).await;
                Err(e)
            }
        }
    }

    /// Loaded --unload--> Unloaded
    ///
    /// The plugin's tracked commands are always cleared, even when the host
    /// fails to tear the module down.
    pub async fn unload(&mut self, name: &str) -> Result<(), PluginError> {
        let removed = self.unregister_all(name);

        let result = if self.host.is_loaded(name) {
            self.host.unload(name).await
        } else {
            Ok(())
        };
        self.set_state(name, PluginState::Unloaded);
        self.sync_scopes(removed).await;

        match result {
            Ok(()) => {
                info!(plugin = %name, "Unloaded plugin");
                Ok(())
            }
            Err(e) => {
                error!(plugin = %name, error = %e, "Failed to unload plugin");
                Err(e)
            }
        }
    }

    /// Drop the record of a plugin whose file is gone
    pub fn forget(&mut self, name: &str) -> Option<PluginRecord> {
        let stale = self.tracker.clear(name);
        if !stale.is_empty() {
            warn!(plugin = %name, count = stale.len(), "Dropping stale command registrations");
        }
        self.records.remove(name)
    }

    fn observe(&mut self, name: &str, modified: SystemTime) -> &PluginRecord {
        let record = self
            .records
            .entry(name.to_string())
            .or_insert_with(|| PluginRecord::new(name, modified));
        record.modified = modified;
        record
    }

    fn set_state(&mut self, name: &str, state: PluginState) {
        if let Some(record) = self.records.get_mut(name) {
            record.state = state;
        }
    }

    /// Load the module and register its commands, then publish `touched`
    /// plus every scope the new commands landed in
    async fn load_fresh(&mut self, name: &str, mut touched: BTreeSet<CommandScope>) -> Result<(), PluginError> {
        let result = match self.host.load(name).await {
            Ok(()) => self.register_declared(name).await,
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(added) => {
                self.set_state(name, PluginState::Loaded);
                info!(plugin = %name, commands = self.tracker.entries_for(name).len(), "Loaded plugin");
                touched.extend(added);
                Ok(())
            }
            Err(e) => {
                self.set_state(name, PluginState::Unloaded);
                error!(plugin = %name, error = %e, "Failed to load plugin");
                Err(e)
            }
        };

        self.sync_scopes(touched).await;
        outcome
    }

    /// Add the plugin's declared commands to the live tree.
    ///
    /// On the first rejection everything added so far is removed again and
    /// the module is unloaded.
    async fn register_declared(&mut self, name: &str) -> Result<BTreeSet<CommandScope>, PluginError> {
        let declared = self.host.declared_commands(name);
        let scope = declared.scope;

        for spec in declared.commands {
            let command = spec.name.clone();
            match self.host.add_command(name, spec, scope) {
                Ok(()) => {
                    self.tracker.record(name, command.as_str(), scope);
                    info!(plugin = %name, scope = %scope, "Registered command /{}", command);
                }
                Err(e) => {
                    self.unregister_all(name);
                    if let Err(unload) = self.host.unload(name).await {
                        warn!(plugin = %name, error = %unload, "Unload after failed registration failed");
                    }
                    return Err(e);
                }
            }
        }

        Ok(self.tracker.scopes_for(name))
    }

    /// Remove every tracked command of a plugin, returning the scopes touched
    fn unregister_all(&mut self, name: &str) -> BTreeSet<CommandScope> {
        let mut scopes = BTreeSet::new();
        for registration in self.tracker.clear(name) {
            scopes.insert(registration.scope);
            match self.host.remove_command(&registration.command, registration.scope) {
                Ok(()) => info!(plugin = %name, "Unregistered command {}", registration),
                Err(e) => warn!(plugin = %name, error = %e, "Failed to unregister command {}", registration),
            }
        }
        scopes
    }

    async fn sync_scopes(&self, scopes: BTreeSet<CommandScope>) {
        for scope in scopes {
            if let Err(e) = self.sync.sync(scope).await {
                error!(scope = %scope, error = %e, "Giving up on command sync");
            }
        }
    }
}
