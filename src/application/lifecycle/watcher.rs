//! Watch loop - Polls the plugin directory and applies changes

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::infrastructure::plugins::{PluginFileIndex, SnapshotDiff};
use super::controller::LifecycleController;

/// Single task that keeps loaded plugins in step with the plugin directory
pub struct WatchLoop {
    index: PluginFileIndex,
    controller: LifecycleController,
    interval: Duration,
}

impl WatchLoop {
    pub fn new(index: PluginFileIndex, controller: LifecycleController, interval: Duration) -> Self {
        Self {
            index,
            controller,
            interval,
        }
    }

    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    /// Wait for the connection to be ready, load every plugin, then poll
    /// until shutdown is signalled.
    pub async fn run(mut self, mut ready: watch::Receiver<bool>, mut shutdown: watch::Receiver<bool>) -> LifecycleController {
        tokio::select! {
            is_ready = wait_until(&mut ready) => {
                if !is_ready {
                    warn!("Connection closed before it became ready, not loading plugins");
                    return self.controller;
                }
            }
            _ = wait_until(&mut shutdown) => return self.controller,
        }

        info!("Connection ready, loading plugins from {}", self.index.directory().display());
        self.poll().await;

        info!("Watching plugins (poll interval: {:?})", self.interval);
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = wait_until(&mut shutdown) => break,
            }
            self.poll().await;
        }

        info!("Plugin watcher stopped");
        self.controller
    }

    /// One poll cycle: load added, unload removed, reload modified plugins.
    ///
    /// The first cycle after startup sees every plugin as added, which is
    /// the initial full load. A failing plugin never stops the cycle.
    pub async fn poll(&mut self) -> SnapshotDiff {
        let current = match self.index.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to scan {}: {}", self.index.directory().display(), e);
                return SnapshotDiff::default();
            }
        };

        let diff = SnapshotDiff::between(&self.controller.observed(), &current);
        if diff.is_empty() {
            return diff;
        }
        debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            modified = diff.modified.len(),
            "Plugin directory changed"
        );

        for name in &diff.added {
            if let Err(e) = self.controller.load(name, current[name]).await {
                debug!(plugin = %name, error = %e, "Load failed, waiting for the file to change");
            }
        }

        for name in &diff.removed {
            if let Err(e) = self.controller.unload(name).await {
                debug!(plugin = %name, error = %e, "Unload failed, dropping plugin anyway");
            }
            self.controller.forget(name);
        }

        for name in &diff.modified {
            if let Err(e) = self.controller.reload(name, current[name]).await {
                debug!(plugin = %name, error = %e, "Reload failed, waiting for the file to change");
            }
        }

        diff
    }
}

/// Resolve once the flag is set; `false` if the sender went away first
async fn wait_until(rx: &mut watch::Receiver<bool>) -> bool {
    loop {
        if *rx.borrow_and_update() {
            return true;
        }
        if rx.changed().await.is_err() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::sync::{RemoteRegistrySyncClient, RetryPolicy};
    use crate::domain::entities::{create_command_tree, PluginState};
    use crate::infrastructure::adapters::console::LoggingRegistry;
    use crate::infrastructure::plugins::{LocalPluginHost, PluginLoader};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::SystemTime;

    fn write(dir: &Path, name: &str, content: &str, secs: u64) {
        let path = dir.join(format!("{}.yaml", name));
        std::fs::write(&path, content).unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    fn watch_loop(dir: &Path) -> (WatchLoop, Arc<LoggingRegistry>) {
        let tree = create_command_tree();
        let host = Arc::new(LocalPluginHost::new(PluginLoader::new(dir, "yaml"), tree.clone()));
        let registry = Arc::new(LoggingRegistry::new());
        let sync = RemoteRegistrySyncClient::new(registry.clone(), tree, RetryPolicy::default());
        let controller = LifecycleController::new(host, sync);
        let index = PluginFileIndex::new(dir, "yaml");
        (WatchLoop::new(index, controller, Duration::from_secs(2)), registry)
    }

    #[tokio::test]
    async fn test_broken_plugin_does_not_stop_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken", "kind: [oops", 1);
        write(dir.path(), "good", "app-commands:\n  - name: good\n    description: good\n", 1);

        let (mut watcher, registry) = watch_loop(dir.path());
        let diff = watcher.poll().await;

        assert_eq!(diff.added, vec!["broken", "good"]);
        assert_eq!(watcher.controller().state("broken"), Some(PluginState::Unloaded));
        assert_eq!(watcher.controller().state("good"), Some(PluginState::Loaded));
        assert_eq!(registry.publish_count(), 1);

        // A failed plugin is not retried until its file changes
        assert!(watcher.poll().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_ready_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "alpha", "app-commands:\n  - name: alpha\n    description: alpha\n", 1);

        let (watcher, registry) = watch_loop(dir.path());
        let (ready_tx, ready_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(watcher.run(ready_rx, shutdown_rx));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(registry.publish_count(), 0);

        ready_tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send(true).unwrap();

        let controller = handle.await.unwrap();
        assert_eq!(controller.state("alpha"), Some(PluginState::Loaded));
        assert_eq!(registry.publish_count(), 1);
    }
}
