//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod plugin_host;
pub mod registry;

pub use bot::{Bot, BotInfo};
pub use plugin_host::PluginHost;
pub use registry::RemoteRegistry;
