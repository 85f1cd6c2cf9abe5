use std::fmt;
use std::time::SystemTime;

/// Persisted lifecycle state of a plugin
///
/// Loading, reloading and unloading are operations, not states: a plugin
/// is only ever observed before or after one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Unloaded,
    Loaded,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginState::Unloaded => write!(f, "unloaded"),
            PluginState::Loaded => write!(f, "loaded"),
        }
    }
}

/// A plugin file the manager has observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub name: String,
    /// Modification time of the backing file when last observed
    pub modified: SystemTime,
    pub state: PluginState,
}

impl PluginRecord {
    pub fn new(name: impl Into<String>, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            modified,
            state: PluginState::Unloaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state == PluginState::Loaded
    }
}
