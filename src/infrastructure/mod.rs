//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Plugin files, manifests and the local plugin host
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod plugins;
pub mod adapters;
