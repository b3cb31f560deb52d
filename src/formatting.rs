// src/formatting.rs

use crate::core::LogEntry;
use crate::error::{Error, Result};
use serde_json::Value;

/// A trait for turning a single log entry into message text.
pub trait EntryFormatter: Send + Sync {
    fn format(&self, entry: &dyn LogEntry) -> Result<String>;
}

/// The default layout: timestamp, level, a `===` separator, then the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct VanillaFormatter;

impl EntryFormatter for VanillaFormatter {
    fn format(&self, entry: &dyn LogEntry) -> Result<String> {
        let fields = entry.serialized();
        let present = |key: &str| fields.get(key).filter(|v| !v.is_null());
        let (Some(dt), Some(_), Some(text)) = (present("dt"), present("level"), present("text")) else {
            return Err(Error::MalformedEntry(
                "entry must expose `dt`, `level` and `text`".to_string(),
            ));
        };

        Ok(format!(
            "{}\n{}\n===\n{}\n",
            plain(dt),
            entry.level(),
            plain(text)
        ))
    }
}

/// Renders strings without JSON quoting.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
