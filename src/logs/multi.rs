use crate::core::{EmbeddableLog, Log, LogEntry};
use crate::error::{Error, Result};
use crate::registry::{tagged, LogRegistry};
use serde_json::{Map, Value};

/// An embeddable log that appends every entry to each of its children.
#[derive(Debug, Clone, Default)]
pub struct MultiLog {
    logs: Vec<Box<dyn Log>>,
}

impl MultiLog {
    pub const TYPE_TAG: &'static str = "multi";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> &[Box<dyn Log>] {
        &self.logs
    }
}

impl Log for MultiLog {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn with_entry(&self, entry: &dyn LogEntry) -> Result<Box<dyn Log>> {
        let logs = self
            .logs
            .iter()
            .map(|log| log.with_entry(entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Self { logs }))
    }

    fn serialized(&self) -> Result<Map<String, Value>> {
        let logs = self
            .logs
            .iter()
            .map(|log| tagged(log.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut state = Map::new();
        state.insert("logs".to_string(), Value::Array(logs));
        Ok(state)
    }

    fn unserialized(&self, state: &Map<String, Value>, registry: &LogRegistry) -> Result<Box<dyn Log>> {
        let records = state
            .get("logs")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::MalformedSnapshot("`logs` must be an array".to_string()))?;
        let logs = records
            .iter()
            .map(|record| registry.restore_tagged(record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(Self { logs }))
    }

    fn as_embeddable(&self) -> Option<&dyn EmbeddableLog> {
        Some(self)
    }

    fn clone_box(&self) -> Box<dyn Log> {
        Box::new(self.clone())
    }
}

impl EmbeddableLog for MultiLog {
    fn with_embedded(&self, log: Box<dyn Log>) -> Box<dyn Log> {
        let mut obj = self.clone();
        obj.logs.push(log);
        Box::new(obj)
    }
}
