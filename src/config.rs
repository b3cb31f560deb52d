//! Configuration management for telegram-log
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a `telegram-log.toml` file,
//! `TELEGRAM_LOG_` environment variables and finally command-line arguments.

use crate::cli::Cli;
use crate::core::Level;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "telegram-log.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The filter used for the application's own diagnostics.
    pub log_level: String,
    /// Where and how entries are relayed.
    pub telegram: TelegramConfig,
    /// Persistence of the decorator chain between runs.
    pub store: StoreConfig,
}

/// Configuration for relaying entries to Telegram.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TelegramConfig {
    /// The chat that receives relayed entries.
    #[serde(default)]
    pub chat_id: Option<i64>,
    /// The full `sendMessage` uri, including the bot token.
    #[serde(default)]
    pub request_uri: Option<String>,
    /// Entries below this level are recorded but not relayed.
    #[serde(default)]
    pub min_level: Option<Level>,
    /// Timeout for a single delivery in seconds.
    pub timeout_seconds: u64,
    /// Whether to accept invalid TLS certificates (for testing).
    pub allow_invalid_certs: bool,
}

/// Configuration for snapshot persistence.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct StoreConfig {
    /// JSON file the decorator snapshot is loaded from and saved to.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file, the
    /// environment and the command line, in that order.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. TELEGRAM_LOG_TELEGRAM__CHAT_ID=42
            .merge(Env::prefixed("TELEGRAM_LOG_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            telegram: TelegramConfig {
                chat_id: None,
                request_uri: None,
                min_level: None,
                timeout_seconds: 10,
                allow_invalid_certs: false,
            },
            store: StoreConfig::default(),
        }
    }
}
