//! Type-tag registry used to restore wrapped logs from snapshots.
//!
//! Snapshots name the wrapped log by a stable tag. Only tags registered here
//! can be instantiated, so untrusted snapshot data never picks an arbitrary
//! type.

use crate::core::Log;
use crate::error::{Error, Result};
use crate::logs::{MemoryLog, MultiLog, NullLog, TracingLog};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A zero-argument constructor for a registered log type.
pub type LogConstructor = Arc<dyn Fn() -> Box<dyn Log> + Send + Sync>;

#[derive(Clone, Default)]
pub struct LogRegistry {
    constructors: HashMap<String, LogConstructor>,
}

impl LogRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that knows the plain logs shipped with this crate.
    ///
    /// `telegram` is left out: a nested decorator restored from a snapshot
    /// would deliver to whatever `requestUri` the snapshot names, through a
    /// fresh `HttpTransport` rather than the receiver's transport. Register it
    /// explicitly when snapshots come from a trusted source.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(MemoryLog::TYPE_TAG, || Box::new(MemoryLog::new()))
            .with(NullLog::TYPE_TAG, || Box::new(NullLog))
            .with(MultiLog::TYPE_TAG, || Box::new(MultiLog::new()))
            .with(TracingLog::TYPE_TAG, || Box::new(TracingLog))
    }

    /// Registers `constructor` under `tag`, replacing any previous entry.
    pub fn register<F>(&mut self, tag: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Log> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Arc::new(constructor));
    }

    /// Builder-style variant of [`LogRegistry::register`].
    pub fn with<F>(mut self, tag: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Log> + Send + Sync + 'static,
    {
        self.register(tag, constructor);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Builds a blank log for `tag`.
    ///
    /// The constructed log must report the same tag it was registered under,
    /// otherwise it is rejected.
    pub fn construct(&self, tag: &str) -> Result<Box<dyn Log>> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| Error::MalformedSnapshot(format!("unknown log type `{tag}`")))?;
        let log = constructor();
        if log.type_tag() != tag {
            return Err(Error::MalformedSnapshot(format!(
                "log type `{tag}` constructed a `{}` log",
                log.type_tag()
            )));
        }
        Ok(log)
    }

    /// Builds the log for `tag` and loads `state` into it.
    pub fn restore(&self, tag: &str, state: &Map<String, Value>) -> Result<Box<dyn Log>> {
        self.construct(tag)?.unserialized(state, self)
    }

    /// Splits a `{ typeTag, state }` record and restores it.
    pub fn restore_tagged(&self, record: &Value) -> Result<Box<dyn Log>> {
        let tag = record
            .get("typeTag")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedSnapshot("`typeTag` must be a string".to_string()))?;
        let state = record
            .get("state")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::MalformedSnapshot("`state` must be an object".to_string()))?;
        self.restore(tag, state)
    }
}

impl fmt::Debug for LogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("LogRegistry").field("tags", &tags).finish()
    }
}

/// Serializes `log` as a `{ typeTag, state }` record.
pub fn tagged(log: &dyn Log) -> Result<Value> {
    let mut record = Map::new();
    record.insert("typeTag".to_string(), Value::from(log.type_tag()));
    record.insert("state".to_string(), Value::Object(log.serialized()?));
    Ok(Value::Object(record))
}
