//! Message dispatcher - Routes command messages to plugins

use std::sync::Arc;
use crate::domain::entities::{Invocation, Message};
use crate::domain::traits::PluginHost;
use crate::application::errors::BotError;
use super::parser::MessageParser;

/// Message dispatcher - parses messages and runs the plugin command they name
pub struct MessageDispatcher {
    parser: MessageParser,
    host: Arc<dyn PluginHost>,
}

impl MessageDispatcher {
    pub fn new(prefix: impl Into<String>, host: Arc<dyn PluginHost>) -> Self {
        Self {
            parser: MessageParser::new(prefix),
            host,
        }
    }

    /// Handle a message; `Ok(None)` when there is nothing to reply.
    ///
    /// Commands no plugin handles are ignored, since group chats are shared
    /// with other bots.
    pub fn dispatch(&self, message: Message) -> Result<Option<String>, BotError> {
        let message = self.parser.parse(message);
        let Some(invocation) = Invocation::from_message(&message) else {
            return Ok(None);
        };

        tracing::debug!("[{}] /{} {:?}", message.chat_id, invocation.command, invocation.args);

        match self.host.execute(&invocation) {
            Ok(Some(reply)) => Ok(Some(reply)),
            Ok(None) => {
                tracing::debug!("[{}] No plugin handles /{}", message.chat_id, invocation.command);
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("[{}] /{} failed: {}", message.chat_id, invocation.command, e);
                Ok(Some(format!("Error: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::{LifecycleController, RemoteRegistrySyncClient, RetryPolicy};
    use crate::domain::entities::create_command_tree;
    use crate::infrastructure::adapters::LoggingRegistry;
    use crate::infrastructure::plugins::{LocalPluginHost, PluginLoader};
    use std::path::Path;
    use std::time::SystemTime;

    #[tokio::test]
    async fn test_dispatch_to_prefix_command() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sus.yaml"),
            "prefix-commands:\n  - name: sus\n    reply: \"{text}\"\n",
        )
        .unwrap();
        let host = Arc::new(LocalPluginHost::new(PluginLoader::new(dir.path(), "yaml"), create_command_tree()));
        host.load("sus").await.unwrap();

        let dispatcher = MessageDispatcher::new("!", host);

        let reply = dispatcher.dispatch(Message::from_text("1", "!sus hello")).unwrap();
        assert_eq!(reply.as_deref(), Some("hello"));

        let usage = dispatcher.dispatch(Message::from_text("1", "!sus")).unwrap().unwrap();
        assert!(usage.starts_with("Error: Invalid arguments"));

        assert_eq!(dispatcher.dispatch(Message::from_text("1", "/unknown")).unwrap(), None);
        assert_eq!(dispatcher.dispatch(Message::from_text("1", "just chatting")).unwrap(), None);
    }

    #[tokio::test]
    async fn test_prefix_and_slash_reach_different_replies() {
        let dir = tempfile::tempdir().unwrap();
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("plugins").join("sus.yaml");
        std::fs::copy(shipped, dir.path().join("sus.yaml")).unwrap();

        let tree = create_command_tree();
        let host = Arc::new(LocalPluginHost::new(PluginLoader::new(dir.path(), "yaml"), tree.clone()));
        let sync = RemoteRegistrySyncClient::new(Arc::new(LoggingRegistry::new()), tree, RetryPolicy::default());
        let mut controller = LifecycleController::new(host.clone(), sync);
        controller.load("sus", SystemTime::now()).await.unwrap();

        let dispatcher = MessageDispatcher::new("!", host);

        let prefix = dispatcher.dispatch(Message::from_text("1", "!sus hello")).unwrap();
        assert_eq!(prefix.as_deref(), Some("hello"));

        let slash = dispatcher.dispatch(Message::from_text("1", "/sus hello")).unwrap();
        assert_eq!(slash.as_deref(), Some("e hello"));
    }
}
