//! Platform adapters

pub mod console;
pub mod telegram;

pub use console::{ConsoleAdapter, LoggingRegistry};
pub use telegram::{TelegramAdapter, TelegramRegistry};
