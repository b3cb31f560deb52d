/// telegram-log - relay log entries to a Telegram chat
///
/// This library provides a log decorator that records every entry in a
/// wrapped log and relays entries above a minimum level to a chat endpoint,
/// together with the registry and base logs needed to snapshot and restore
/// whole decorator chains.
pub mod notification;

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod formatting;
pub mod logs;
pub mod registry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
pub use error::{Error, Result};
pub use notification::TelegramLog;
pub use registry::LogRegistry;
