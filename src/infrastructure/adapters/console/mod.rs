//! Console adapter for development/testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use crate::domain::entities::{CommandScope, CommandSpec, Message};
use crate::domain::traits::{Bot, BotInfo, RemoteRegistry};
use crate::application::errors::BotError;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    lines: Option<Lines<BufReader<Stdin>>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "hotswap-bot".to_string(),
                username: "console".to_string(),
            },
            lines: None,
        }
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&mut self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        self.lines = Some(BufReader::new(tokio::io::stdin()).lines());
        Ok(())
    }

    async fn next_messages(&mut self) -> Result<Option<Vec<Message>>, BotError> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| BotError::Internal("console adapter not started".to_string()))?;

        let line = lines
            .next_line()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        Ok(line.map(|text| {
            vec![Message::from_text("console", text.trim())
                .with_sender("console")
                .with_platform("console")]
        }))
    }

    async fn send_message(&self, _chat_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT] {}", text);
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Command registry stand-in for dev mode: keeps the last published set
/// per scope and logs it
#[derive(Default)]
pub struct LoggingRegistry {
    published: Mutex<HashMap<CommandScope, Vec<CommandSpec>>>,
    publishes: AtomicUsize,
}

impl LoggingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last set published for a scope
    pub fn published(&self, scope: CommandScope) -> Vec<CommandSpec> {
        self.published
            .lock()
            .ok()
            .and_then(|p| p.get(&scope).cloned())
            .unwrap_or_default()
    }

    /// Number of publish calls so far
    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteRegistry for LoggingRegistry {
    async fn publish(&self, scope: CommandScope, commands: &[CommandSpec]) -> Result<(), BotError> {
        let mut published = self
            .published
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        published.insert(scope, commands.to_vec());
        self.publishes.fetch_add(1, Ordering::SeqCst);

        let names: Vec<String> = commands.iter().map(|c| format!("/{}", c.name)).collect();
        tracing::info!(scope = %scope, "Published commands: [{}]", names.join(", "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_replaces_scope() {
        let registry = LoggingRegistry::new();
        let sus = vec![CommandSpec::new("sus", "sus")];

        registry.publish(CommandScope::Global, &sus).await.unwrap();
        registry.publish(CommandScope::Global, &sus).await.unwrap();
        assert_eq!(registry.published(CommandScope::Global), sus);
        assert_eq!(registry.publish_count(), 2);

        registry.publish(CommandScope::Global, &[]).await.unwrap();
        assert!(registry.published(CommandScope::Global).is_empty());
        assert!(registry.published(CommandScope::Group(1)).is_empty());
    }
}
