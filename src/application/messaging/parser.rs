//! Message parser - Turns raw text messages into command messages

use crate::domain::entities::{Content, InvocationKind, Message};

/// Parses incoming text into command messages
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Rewrite a text message as a command if it starts with `/` or the prefix
    pub fn parse(&self, message: Message) -> Message {
        let Content::Text(text) = &message.content else {
            return message;
        };

        match self.parse_command(text) {
            Some((name, args, kind)) => Message {
                content: Content::Command { name, args, kind },
                ..message
            },
            None => message,
        }
    }

    /// Split `/name@bot arg1 arg2` into its name, arguments and trigger
    fn parse_command(&self, text: &str) -> Option<(String, Vec<String>, InvocationKind)> {
        let text = text.trim();
        let (cmd_text, kind) = if let Some(rest) = text.strip_prefix('/') {
            (rest, InvocationKind::App)
        } else if !self.command_prefix.is_empty() {
            (text.strip_prefix(self.command_prefix.as_str())?, InvocationKind::Prefix)
        } else {
            return None;
        };

        let mut parts = cmd_text.split_whitespace();
        let head = parts.next()?;
        // Telegram appends @botname to commands sent in groups
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some((name, parts.map(|s| s.to_string()).collect(), kind))
    }
}
