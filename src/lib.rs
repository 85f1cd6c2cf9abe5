//! hotswap-bot - A chat bot whose plugins can be added, changed and removed
//! while it runs

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod plugins;
pub mod host;

pub use host::BotHost;
