//! Core domain types and capability traits for telegram-log
//!
//! This module defines the log levels, the entry contract consumed by the
//! formatter, and the `Log` / `EmbeddableLog` capabilities that every wrapped
//! log implements. All logs are persistent values: an operation never mutates
//! the receiver, it returns a new log.

use crate::error::{Error, Result};
use crate::registry::LogRegistry;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry, totally ordered from `Debug` to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    #[serde(alias = "crit")]
    Critical,
}

impl Level {
    /// Integer rank used in snapshots.
    pub fn rank(self) -> i64 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Warning => 2,
            Self::Error => 3,
            Self::Critical => 4,
        }
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            0 => Some(Self::Debug),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" | "crit" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// An entry that can be appended to a log.
///
/// `serialized` is expected to expose the `dt`, `level` and `text` keys;
/// consumers such as the formatter reject entries that do not.
pub trait LogEntry: Send + Sync {
    fn level(&self) -> Level;
    fn serialized(&self) -> Map<String, Value>;
}

/// The standard log entry: a UTC timestamp, a level and free-form text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub dt: DateTime<Utc>,
    #[serde(with = "level_rank")]
    pub level: Level,
    pub text: String,
}

impl Entry {
    /// Creates an entry stamped with the current time.
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Self::at(Utc::now(), level, text)
    }

    pub fn at(dt: DateTime<Utc>, level: Level, text: impl Into<String>) -> Self {
        Self {
            dt,
            level,
            text: text.into(),
        }
    }
}

impl LogEntry for Entry {
    fn level(&self) -> Level {
        self.level
    }

    fn serialized(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "dt".to_string(),
            Value::from(self.dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        map.insert("level".to_string(), Value::from(self.level.rank()));
        map.insert("text".to_string(), Value::from(self.text.clone()));
        map
    }
}

mod level_rank {
    use super::Level;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(level.rank())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let rank = i64::deserialize(deserializer)?;
        Level::from_rank(rank).ok_or_else(|| de::Error::custom(format!("invalid level rank {rank}")))
    }
}

// =============================================================================
// Log Capabilities
// =============================================================================

/// An append-only log with its own persistence format.
pub trait Log: Send + Sync {
    /// Stable identifier used to restore this log from a snapshot.
    fn type_tag(&self) -> &'static str;

    /// Returns a new log with `entry` appended.
    fn with_entry(&self, entry: &dyn LogEntry) -> Result<Box<dyn Log>>;

    /// Serializes the log's own state.
    fn serialized(&self) -> Result<Map<String, Value>>;

    /// Builds a log of this type from previously serialized state.
    ///
    /// Composite logs use `registry` to restore their children.
    fn unserialized(&self, state: &Map<String, Value>, registry: &LogRegistry) -> Result<Box<dyn Log>>;

    /// Returns the embedding capability when this log supports it.
    fn as_embeddable(&self) -> Option<&dyn EmbeddableLog> {
        None
    }

    fn clone_box(&self) -> Box<dyn Log>;
}

impl Clone for Box<dyn Log> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log").field("type_tag", &self.type_tag()).finish()
    }
}

/// A log that can absorb another log, e.g. by multiplexing into both.
pub trait EmbeddableLog: Log {
    fn with_embedded(&self, log: Box<dyn Log>) -> Box<dyn Log>;
}

/// Reads a required object field out of a serialized state map.
pub(crate) fn object_field<'a>(state: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>> {
    state
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::MalformedSnapshot(format!("`{key}` must be an object")))
}
