use async_trait::async_trait;
use crate::domain::entities::Message;
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Connect and authenticate; returning `Ok` means the connection is ready
    async fn start(&mut self) -> Result<(), BotError>;

    /// Wait for the next batch of incoming messages.
    ///
    /// `Ok(None)` means the connection was closed by the other side.
    async fn next_messages(&mut self) -> Result<Option<Vec<Message>>, BotError>;

    /// Send a message to a chat
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
