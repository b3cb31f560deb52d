use crate::core::{Level, Log, LogEntry};
use crate::error::Result;
use crate::registry::LogRegistry;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

/// A log that emits every entry as a `tracing` event at the matching level.
///
/// `Critical` entries are emitted at `ERROR` with `critical = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl TracingLog {
    pub const TYPE_TAG: &'static str = "tracing";
}

impl Log for TracingLog {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn with_entry(&self, entry: &dyn LogEntry) -> Result<Box<dyn Log>> {
        let fields = entry.serialized();
        let text = fields.get("text").and_then(Value::as_str).unwrap_or_default();
        let dt = fields.get("dt").and_then(Value::as_str).unwrap_or_default();
        match entry.level() {
            Level::Debug => debug!(dt, "{}", text),
            Level::Info => info!(dt, "{}", text),
            Level::Warning => warn!(dt, "{}", text),
            Level::Error => error!(dt, "{}", text),
            Level::Critical => error!(dt, critical = true, "{}", text),
        }
        Ok(Box::new(TracingLog))
    }

    fn serialized(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn unserialized(&self, _state: &Map<String, Value>, _registry: &LogRegistry) -> Result<Box<dyn Log>> {
        Ok(Box::new(TracingLog))
    }

    fn clone_box(&self) -> Box<dyn Log> {
        Box::new(*self)
    }
}
