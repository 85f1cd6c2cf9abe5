//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::application::lifecycle::RetryPolicy;

/// File holding the bot token when none is configured
const TOKEN_FILE: &str = "token.txt";

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub sync: SyncConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Prefix for local text commands, in addition to `/`
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    /// Extension of plugin files, without the dot
    pub extension: String,
    pub poll_interval_ms: u64,
    /// Load plugins and watch the directory at all
    pub auto_load: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyncConfig {
    pub retry_count: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "hotswap-bot".to_string(),
            prefix: "!".to_string(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            extension: "yaml".to_string(),
            poll_interval_ms: 2000,
            auto_load: true,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            telegram: Some(TelegramConfig::default()),
            console: Some(ConsoleConfig::default()),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Messaging adapter to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterChoice {
    Telegram(String),
    Console,
}

impl PluginConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SyncConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_count,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            let tg = self.adapters.telegram.get_or_insert(TelegramConfig {
                enabled: true,
                token: None,
            });
            tg.token = Some(token);
            tg.enabled = true;
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(dir) = std::env::var("PLUGINS_DIR") {
            self.plugins.directory = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugins.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("plugins.poll-interval-ms must be greater than 0".to_string()));
        }
        if self.sync.retry_count == 0 {
            return Err(ConfigError::InvalidValue("sync.retry-count must be at least 1".to_string()));
        }
        if self.plugins.extension.is_empty() || self.plugins.extension.starts_with('.') {
            return Err(ConfigError::InvalidValue("plugins.extension must be given without a leading dot".to_string()));
        }
        Ok(())
    }

    /// Bot token from, in order: the CLI, the config file, `token.txt`
    pub fn resolve_token(&self, cli_token: Option<String>) -> Option<String> {
        cli_token
            .or_else(|| {
                self.adapters
                    .telegram
                    .as_ref()
                    .filter(|t| t.enabled)
                    .and_then(|t| t.token.clone())
            })
            .or_else(|| read_token_file(Path::new(TOKEN_FILE)))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl Config {
    /// Telegram when a token resolves, else the console adapter if enabled
    pub fn select_adapter(&self, cli_token: Option<String>) -> Result<AdapterChoice, ConfigError> {
        self.adapter_for(self.resolve_token(cli_token))
    }

    fn adapter_for(&self, token: Option<String>) -> Result<AdapterChoice, ConfigError> {
        if let Some(token) = token {
            return Ok(AdapterChoice::Telegram(token));
        }

        let console = self.adapters.console.as_ref().map(|c| c.enabled).unwrap_or(false);
        if console {
            Ok(AdapterChoice::Console)
        } else {
            Err(ConfigError::InvalidValue(
                "no bot token found and adapters.console is disabled".to_string(),
            ))
        }
    }
}

fn read_token_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().next().map(|line| line.trim().to_string())
}

/// Shorten a token for logging
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.is_empty() {
        return "<no token>".to_string();
    }
    let keep = if chars.len() <= 10 { 2 } else { 4 };
    let keep = keep.min(chars.len());
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}...{}", head, tail)
}
