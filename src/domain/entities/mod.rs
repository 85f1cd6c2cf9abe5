//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod plugin;

pub use command::{
    create_command_tree, CommandRegistration, CommandScope, CommandSpec, CommandTree,
    DeclaredCommands, SharedCommandTree, TreeEntry,
};
pub use message::{Content, Invocation, InvocationKind, Message};
pub use plugin::{PluginRecord, PluginState};
