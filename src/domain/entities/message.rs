use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Parsed command; `kind` records whether `/` or the text prefix
    /// triggered it
    Command {
        name: String,
        args: Vec<String>,
        kind: InvocationKind,
    },
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Represents an incoming message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: Option<String>,
    pub content: Content,
    /// When the platform says the message was sent
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: None,
            content,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn from_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(chat_id, Content::Text(text.into()))
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// How a command reached the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// `/name`: declarative command resolved through the live command tree
    App,
    /// `<prefix>name`: local text command
    Prefix,
}

/// A command call routed to a plugin
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
    pub kind: InvocationKind,
    pub chat_id: String,
    pub sent_at: DateTime<Utc>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, args: Vec<String>, kind: InvocationKind) -> Self {
        Self {
            command: command.into(),
            args,
            kind,
            chat_id: String::new(),
            sent_at: Utc::now(),
        }
    }

    /// Build a call from a parsed command message
    pub fn from_message(message: &Message) -> Option<Self> {
        let Content::Command { name, args, kind } = &message.content else {
            return None;
        };
        Some(Self {
            command: name.clone(),
            args: args.clone(),
            kind: *kind,
            chat_id: message.chat_id.clone(),
            sent_at: message.timestamp,
        })
    }

    pub fn with_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = chat_id.into();
        self
    }

    /// Arguments joined back into the text the user typed
    pub fn text(&self) -> String {
        self.args.join(" ")
    }
}
