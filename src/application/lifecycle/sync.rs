//! Remote registry sync - Publishes the command tree with bounded retries

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandScope, SharedCommandTree};
use crate::domain::traits::RemoteRegistry;

/// Attempt count and spacing for publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

/// Pushes the live command tree of one scope to the remote registry
///
/// Every call publishes the complete current set for the scope; calls are
/// not coalesced.
#[derive(Clone)]
pub struct RemoteRegistrySyncClient {
    registry: Arc<dyn RemoteRegistry>,
    tree: SharedCommandTree,
    policy: RetryPolicy,
}

impl RemoteRegistrySyncClient {
    pub fn new(registry: Arc<dyn RemoteRegistry>, tree: SharedCommandTree, policy: RetryPolicy) -> Self {
        Self {
            registry,
            tree,
            policy,
        }
    }

    pub async fn sync(&self, scope: CommandScope) -> Result<(), PluginError> {
        let attempts = self.policy.attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            // Re-read every attempt so a retry publishes the latest state
            let commands = {
                let tree = self.tree.read().map_err(|_| PluginError::SyncExhausted {
                    scope: scope.to_string(),
                    attempts: attempt - 1,
                    last: "command tree lock poisoned".to_string(),
                })?;
                tree.commands_in(scope)
            };

            match self.registry.publish(scope, &commands).await {
                Ok(()) => {
                    tracing::info!(scope = %scope, commands = commands.len(), attempt, "Synced commands");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(scope = %scope, attempt, error = %e, "Command sync failed");
                    last = e.to_string();
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(PluginError::SyncExhausted {
            scope: scope.to_string(),
            attempts,
            last,
        })
    }
}
