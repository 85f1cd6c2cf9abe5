//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Plugin lifecycle errors
///
/// `Load`, `Unload`, `CommandRegistration` and `SyncExhausted` are the four
/// failure kinds a lifecycle transition can end in. None of them is ever
/// raised to the host process; the controller logs them and moves on.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Failed to load plugin '{plugin}': {reason}")]
    Load { plugin: String, reason: String },

    #[error("Failed to unload plugin '{plugin}': {reason}")]
    Unload { plugin: String, reason: String },

    #[error("Command '{command}' ({scope}) rejected: {reason}")]
    CommandRegistration {
        command: String,
        scope: String,
        reason: String,
    },

    #[error("Sync of {scope} commands failed after {attempts} attempts: {last}")]
    SyncExhausted {
        scope: String,
        attempts: u32,
        last: String,
    },

    #[error("Plugin not loaded: {0}")]
    NotFound(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),
}

impl PluginError {
    pub fn load(plugin: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::Load {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unload(plugin: impl Into<String>, reason: impl ToString) -> Self {
        PluginError::Unload {
            plugin: plugin.into(),
            reason: reason.to_string(),
        }
    }

    pub fn registration(
        command: impl Into<String>,
        scope: impl ToString,
        reason: impl ToString,
    ) -> Self {
        PluginError::CommandRegistration {
            command: command.into(),
            scope: scope.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
