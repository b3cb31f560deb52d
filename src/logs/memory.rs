use crate::core::{Log, LogEntry};
use crate::error::{Error, Result};
use crate::registry::LogRegistry;
use serde_json::{Map, Value};

/// An append-only log that keeps the serialized form of every entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryLog {
    entries: Vec<Map<String, Value>>,
}

impl MemoryLog {
    pub const TYPE_TAG: &'static str = "memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded entries, oldest first.
    pub fn entries(&self) -> &[Map<String, Value>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `text` field of every recorded entry.
    pub fn texts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| entry.get("text").and_then(Value::as_str))
            .collect()
    }

    /// Reads a `MemoryLog` back out of its serialized state.
    pub fn from_state(state: &Map<String, Value>) -> Result<Self> {
        let entries = state
            .get("entries")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::MalformedSnapshot("`entries` must be an array".to_string()))?;
        let entries = entries
            .iter()
            .map(|entry| {
                entry
                    .as_object()
                    .cloned()
                    .ok_or_else(|| Error::MalformedSnapshot("log entries must be objects".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

impl Log for MemoryLog {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn with_entry(&self, entry: &dyn LogEntry) -> Result<Box<dyn Log>> {
        let mut obj = self.clone();
        obj.entries.push(entry.serialized());
        Ok(Box::new(obj))
    }

    fn serialized(&self) -> Result<Map<String, Value>> {
        let mut state = Map::new();
        state.insert(
            "entries".to_string(),
            Value::Array(self.entries.iter().cloned().map(Value::Object).collect()),
        );
        Ok(state)
    }

    fn unserialized(&self, state: &Map<String, Value>, _registry: &LogRegistry) -> Result<Box<dyn Log>> {
        Ok(Box::new(Self::from_state(state)?))
    }

    fn clone_box(&self) -> Box<dyn Log> {
        Box::new(self.clone())
    }
}
