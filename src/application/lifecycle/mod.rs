//! Plugin lifecycle management
//!
//! The watch loop polls the plugin directory and hands every change to the
//! lifecycle controller, which keeps the live command tree, the
//! registration tracker and the remote registry consistent.

pub mod controller;
pub mod sync;
pub mod tracker;
pub mod watcher;

pub use controller::LifecycleController;
pub use sync::{RemoteRegistrySyncClient, RetryPolicy};
pub use tracker::CommandRegistrationTracker;
pub use watcher::WatchLoop;
