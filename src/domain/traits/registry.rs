use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandScope, CommandSpec};

/// Platform-hosted registry of declarative commands
///
/// `publish` replaces the whole command set of one scope, so publishing the
/// same set twice leaves the registry unchanged. Implementations are
/// expected to be rate limited and eventually consistent.
#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    async fn publish(&self, scope: CommandScope, commands: &[CommandSpec]) -> Result<(), BotError>;
}
