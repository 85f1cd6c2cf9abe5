//! Plugin system for hotswap-bot
//! 
//! Defines what a plugin is and the plugin kinds the host can build from a
//! manifest without loading native code.

pub mod builtin;
pub mod trait_def;

pub use builtin::{PingPlugin, TemplatePlugin};
pub use trait_def::Plugin;
