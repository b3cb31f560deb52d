//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged over
//! the configuration from the `telegram-log.toml` file and environment variables.

use crate::core::Level;
use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Record log entries and relay the important ones to a Telegram chat.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Telegram chat that receives relayed entries.
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub chat_id: Option<i64>,

    /// Full `sendMessage` uri of the bot.
    #[arg(long, value_name = "URI")]
    pub request_uri: Option<String>,

    /// Entries below this level are recorded but not relayed.
    #[arg(long, value_name = "LEVEL")]
    pub min_level: Option<Level>,

    /// JSON file the log state is restored from and saved to.
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Filter for the application's own diagnostics (e.g. "debug").
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Level of the entries being appended.
    #[arg(short, long, value_name = "LEVEL", default_value = "info")]
    pub level: Level,

    /// Entry texts. Read line by line from stdin when none are given.
    #[arg(value_name = "MESSAGE")]
    pub messages: Vec<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(filter) = &self.log_level {
            dict.insert("log_level".into(), Value::from(filter.clone()));
        }

        let mut telegram = Dict::new();
        if let Some(id) = self.chat_id {
            telegram.insert("chat_id".into(), Value::from(id));
        }
        if let Some(uri) = &self.request_uri {
            telegram.insert("request_uri".into(), Value::from(uri.clone()));
        }
        if let Some(level) = self.min_level {
            telegram.insert("min_level".into(), Value::from(level.as_str().to_lowercase()));
        }
        if !telegram.is_empty() {
            dict.insert("telegram".into(), Value::Dict(Tag::Default, telegram));
        }

        if let Some(path) = &self.snapshot {
            let mut store = Dict::new();
            store.insert("snapshot_path".into(), Value::from(path.display().to_string()));
            dict.insert("store".into(), Value::Dict(Tag::Default, store));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
