use crate::core::{Log, LogEntry};
use crate::error::Result;
use crate::registry::LogRegistry;
use serde_json::{Map, Value};

/// A log that discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl NullLog {
    pub const TYPE_TAG: &'static str = "null";
}

impl Log for NullLog {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn with_entry(&self, _entry: &dyn LogEntry) -> Result<Box<dyn Log>> {
        Ok(Box::new(NullLog))
    }

    fn serialized(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    fn unserialized(&self, _state: &Map<String, Value>, _registry: &LogRegistry) -> Result<Box<dyn Log>> {
        Ok(Box::new(NullLog))
    }

    fn clone_box(&self) -> Box<dyn Log> {
        Box::new(*self)
    }
}
