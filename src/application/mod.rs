//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Errors: Domain-specific errors
//! - Lifecycle: Plugin load/unload/reload and command registry sync
//! - Messaging: Message parsing and dispatching

pub mod errors;
pub mod lifecycle;
pub mod messaging;
