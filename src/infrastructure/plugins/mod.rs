//! Plugin infrastructure for hotswap-bot
//! 
//! Plugins are YAML manifest files in a watched directory. A manifest
//! either describes a built-in plugin kind or points at a shared library
//! implementing the `Plugin` trait.

pub mod host;
pub mod index;
pub mod loader;
pub mod manifest;
pub mod registry;

pub use host::LocalPluginHost;
pub use index::{PluginFileIndex, Snapshot, SnapshotDiff};
pub use loader::{PluginHandle, PluginLoader};
pub use manifest::{CommandEntry, PluginKind, PluginManifest};
pub use registry::PluginRegistry;
