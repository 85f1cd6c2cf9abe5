//! Domain layer - Core types with no knowledge of platforms or storage
//! 
//! This layer contains:
//! - Entities: Commands, the live command tree, plugin records, messages
//! - Traits: Abstractions for infrastructure (Bot, PluginHost, RemoteRegistry)

pub mod entities;
pub mod traits;
