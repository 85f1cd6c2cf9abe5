//! Telegram adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::{CommandScope, CommandSpec};
use crate::domain::traits::{Bot, BotInfo, RemoteRegistry};
use crate::application::errors::BotError;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Long-poll timeout for getUpdates
const POLL_TIMEOUT_SECS: i64 = 30;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Get the API URL for a method
fn api_url(token: &str, method: &str) -> String {
    format!("{}/bot{}/{}", API_BASE, token, method)
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
    offset: i64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "hotswap-bot".to_string(),
                username: "hotswap_bot".to_string(),
            },
            offset: 0,
        }
    }

    /// Registry publishing to this bot's command menu
    pub fn registry(&self) -> TelegramRegistry {
        TelegramRegistry {
            token: self.token.clone(),
            client: self.client.clone(),
        }
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let url = api_url(&self.token, "getMe");
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BotError::Auth("Telegram rejected the bot token".to_string()));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id.to_string(),
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let url = api_url(&self.token, "getUpdates");
        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Telegram API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
    }

    /// Convert a Telegram text message into a domain message
    pub fn to_message(message: &Message) -> Option<crate::domain::entities::Message> {
        let text = message.text.as_ref()?;
        let sender = message
            .from
            .as_ref()
            .map(|u| u.username.clone().unwrap_or_else(|| u.id.to_string()))
            .unwrap_or_default();
        let sent_at = DateTime::<Utc>::from_timestamp(message.date, 0).unwrap_or_else(Utc::now);

        Some(
            crate::domain::entities::Message::from_text(message.chat.id.to_string(), text.as_str())
                .with_sender(sender)
                .with_platform("telegram")
                .with_timestamp(sent_at),
        )
    }

    /// Send a message with specific parse mode
    pub async fn send_message_with_format(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest {
            chat_id: String,
            text: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: MessageResult,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        let url = api_url(&self.token, "sendMessage");
        let request = SendMessageRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            parse_mode: parse_mode.map(|s| s.to_string()),
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Telegram API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result.message_id.to_string())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&mut self) -> Result<(), BotError> {
        self.fetch_bot_info().await?;
        tracing::info!("Connected to Telegram as @{}", self.info.username);
        Ok(())
    }

    async fn next_messages(&mut self) -> Result<Option<Vec<crate::domain::entities::Message>>, BotError> {
        let updates = self.get_updates(self.offset, POLL_TIMEOUT_SECS).await?;
        if let Some(next) = Self::get_next_offset(&updates) {
            self.offset = next;
        }

        let messages = updates
            .iter()
            .filter_map(|u| u.message.as_ref())
            .filter_map(Self::to_message)
            .collect();
        Ok(Some(messages))
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_message_with_format(chat_id, text, None).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Telegram's bot-command menu as a remote command registry
#[derive(Clone)]
pub struct TelegramRegistry {
    token: String,
    client: Client,
}

impl TelegramRegistry {
    /// `BotCommandScope` object for a scope
    pub fn scope_object(scope: CommandScope) -> serde_json::Value {
        match scope {
            CommandScope::Global => json!({ "type": "default" }),
            CommandScope::Group(chat_id) => json!({ "type": "chat", "chat_id": chat_id }),
        }
    }
}

#[async_trait]
impl RemoteRegistry for TelegramRegistry {
    async fn publish(&self, scope: CommandScope, commands: &[CommandSpec]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest<'a> {
            commands: Vec<Command<'a>>,
            scope: serde_json::Value,
        }

        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|c| Command {
                    command: &c.name,
                    description: &c.description,
                })
                .collect(),
            scope: Self::scope_object(scope),
        };

        let response = self.client
            .post(api_url(&self.token, "setMyCommands"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("setMyCommands failed ({}): {}", status, error)));
        }

        tracing::debug!(scope = %scope, "Published {} commands to Telegram", commands.len());
        Ok(())
    }
}
