//! A log decorator that relays entries to a Telegram chat.
//!
//! `TelegramLog` wraps any [`Log`]. Every entry is appended to the wrapped
//! log; entries at or above the minimum level are also formatted and posted to
//! the configured request uri (normally the Bot API `sendMessage` method) as a
//! form with the `chat_id` and `text` fields.
//!
//! The decorator is a persistent value. Every `with_*` call returns a new
//! decorator and leaves the receiver as it was.

use crate::core::{object_field, EmbeddableLog, Level, Log, LogEntry};
use crate::error::{Error, Result};
use crate::formatting::{EntryFormatter, VanillaFormatter};
use crate::logs::NullLog;
use crate::notification::transport::{HttpTransport, Transport};
use crate::registry::LogRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// The serialized form of a [`TelegramLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub i: Settings,
    #[serde(rename = "minLevel")]
    pub min_level: i64,
    pub original: TaggedState,
}

/// Delivery settings as they appear under the snapshot's `i` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "chatId", default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(rename = "requestUri", default, skip_serializing_if = "Option::is_none")]
    pub request_uri: Option<String>,
}

/// The wrapped log's own state plus the tag needed to rebuild it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedState {
    #[serde(rename = "typeTag")]
    pub type_tag: String,
    pub state: Map<String, Value>,
}

#[derive(Clone)]
pub struct TelegramLog {
    settings: Settings,
    min_level: Level,
    original: Box<dyn Log>,
    formatter: Arc<dyn EntryFormatter>,
    transport: Arc<dyn Transport>,
    registry: Arc<LogRegistry>,
}

impl TelegramLog {
    pub const TYPE_TAG: &'static str = "telegram";

    /// Wraps `original` with the vanilla formatter, an HTTP transport, the
    /// default registry and a minimum level of `Info`.
    pub fn new(original: Box<dyn Log>) -> Self {
        Self {
            settings: Settings::default(),
            min_level: Level::Info,
            original,
            formatter: Arc::new(VanillaFormatter),
            transport: Arc::new(HttpTransport::default()),
            registry: Arc::new(LogRegistry::with_defaults()),
        }
    }

    pub fn with_chat_id(&self, id: i64) -> Self {
        let mut obj = self.clone();
        obj.settings.chat_id = Some(id);
        obj
    }

    pub fn with_request_uri(&self, uri: impl Into<String>) -> Self {
        let mut obj = self.clone();
        obj.settings.request_uri = Some(uri.into());
        obj
    }

    pub fn with_min_level(&self, level: Level) -> Self {
        let mut obj = self.clone();
        obj.min_level = level;
        obj
    }

    pub fn with_formatter(&self, formatter: Arc<dyn EntryFormatter>) -> Self {
        let mut obj = self.clone();
        obj.formatter = formatter;
        obj
    }

    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        let mut obj = self.clone();
        obj.transport = transport;
        obj
    }

    pub fn with_registry(&self, registry: Arc<LogRegistry>) -> Self {
        let mut obj = self.clone();
        obj.registry = registry;
        obj
    }

    /// Embeds `log` into the wrapped log when it is embeddable, otherwise
    /// replaces the wrapped log with `log`.
    pub fn with_embedded(&self, log: Box<dyn Log>) -> Self {
        let mut obj = self.clone();
        obj.original = match self.original.as_embeddable() {
            Some(embeddable) => embeddable.with_embedded(log),
            None => log,
        };
        obj
    }

    /// Appends `entry` to the wrapped log and relays it when its level is at
    /// least the minimum level.
    ///
    /// # Returns
    /// * `Ok` with a decorator wrapping the appended log
    /// * `Err(Error::Configuration)` if relaying is due but the chat id or the
    ///   request uri is missing
    /// * `Err(Error::MalformedEntry)` if the formatter rejects the entry
    /// * `Err(Error::Delivery)` if the transport fails
    ///
    /// On error no decorator is returned, even though the wrapped log may have
    /// recorded the entry already.
    pub fn with_entry(&self, entry: &dyn LogEntry) -> Result<Self> {
        metrics::counter!("telegram_log_entries_total").increment(1);

        let mut obj = self.clone();
        obj.original = self.original.with_entry(entry)?;

        if entry.level() < self.min_level {
            debug!(level = %entry.level(), min_level = %self.min_level, "Entry below minimum level, not relayed");
            return Ok(obj);
        }

        let (Some(chat_id), Some(request_uri)) = (self.settings.chat_id, self.settings.request_uri.as_deref()) else {
            return Err(Error::Configuration(
                "both chat id and request uri must be set before entries can be relayed".to_string(),
            ));
        };

        let text = self.formatter.format(entry)?;
        let fields = [("chat_id", chat_id.to_string()), ("text", text)];

        info!(chat_id, level = %entry.level(), "Relaying log entry");
        if let Err(e) = self.transport.post(request_uri, &fields) {
            metrics::counter!("telegram_log_delivery_failures_total").increment(1);
            error!(error = %e, chat_id, "Failed to relay log entry");
            return Err(e.into());
        }
        metrics::counter!("telegram_log_deliveries_total").increment(1);

        Ok(obj)
    }

    /// Builds the snapshot of this decorator and its wrapped log.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            i: self.settings.clone(),
            min_level: self.min_level.rank(),
            original: TaggedState {
                type_tag: self.original.type_tag().to_string(),
                state: self.original.serialized()?,
            },
        })
    }

    /// The snapshot as a JSON value.
    pub fn serialized(&self) -> Result<Value> {
        serde_json::to_value(self.snapshot()?).map_err(|e| Error::MalformedSnapshot(e.to_string()))
    }

    /// Restores a decorator from `data` using this decorator's registry.
    ///
    /// The formatter, transport and registry are kept from `self`; they are
    /// not part of a snapshot.
    pub fn restored(&self, data: &Value) -> Result<Self> {
        self.restored_with(data, &self.registry)
    }

    fn restored_with(&self, data: &Value, registry: &LogRegistry) -> Result<Self> {
        let map = data
            .as_object()
            .ok_or_else(|| Error::MalformedSnapshot("snapshot must be an object".to_string()))?;
        object_field(map, "i")?;
        object_field(map, "original")?;
        let snapshot: Snapshot =
            serde_json::from_value(data.clone()).map_err(|e| Error::MalformedSnapshot(e.to_string()))?;
        let min_level = Level::from_rank(snapshot.min_level)
            .ok_or_else(|| Error::MalformedSnapshot(format!("`minLevel` {} is not a level", snapshot.min_level)))?;
        let original = registry.restore(&snapshot.original.type_tag, &snapshot.original.state)?;

        let mut obj = self.clone();
        obj.settings = snapshot.i;
        obj.min_level = min_level;
        obj.original = original;
        Ok(obj)
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.settings.chat_id
    }

    pub fn request_uri(&self) -> Option<&str> {
        self.settings.request_uri.as_deref()
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// The wrapped log.
    pub fn original(&self) -> &dyn Log {
        self.original.as_ref()
    }
}

impl Default for TelegramLog {
    fn default() -> Self {
        Self::new(Box::new(NullLog))
    }
}

impl fmt::Debug for TelegramLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramLog")
            .field("chat_id", &self.settings.chat_id)
            // The uri embeds the bot token.
            .field("request_uri", &self.settings.request_uri.as_ref().map(|_| "<redacted>"))
            .field("min_level", &self.min_level)
            .field("original", &self.original)
            .finish_non_exhaustive()
    }
}

impl Log for TelegramLog {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn with_entry(&self, entry: &dyn LogEntry) -> Result<Box<dyn Log>> {
        Ok(Box::new(TelegramLog::with_entry(self, entry)?))
    }

    fn serialized(&self) -> Result<Map<String, Value>> {
        match TelegramLog::serialized(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::MalformedSnapshot("snapshot did not serialize to an object".to_string())),
        }
    }

    fn unserialized(&self, state: &Map<String, Value>, registry: &LogRegistry) -> Result<Box<dyn Log>> {
        Ok(Box::new(self.restored_with(&Value::Object(state.clone()), registry)?))
    }

    fn as_embeddable(&self) -> Option<&dyn EmbeddableLog> {
        Some(self)
    }

    fn clone_box(&self) -> Box<dyn Log> {
        Box::new(self.clone())
    }
}

impl EmbeddableLog for TelegramLog {
    fn with_embedded(&self, log: Box<dyn Log>) -> Box<dyn Log> {
        Box::new(TelegramLog::with_embedded(self, log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entry;
    use crate::logs::{MemoryLog, MultiLog};
    use crate::test_utils::{FailingTransport, RawEntry, RecordingTransport};
    use chrono::{TimeZone, Utc};
    use reqwest::StatusCode;
    use serde_json::json;

    const URI: &str = "https://api.example/send";

    fn entry(level: Level, text: &str) -> Entry {
        Entry::at(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(), level, text)
    }

    fn configured(transport: &RecordingTransport) -> TelegramLog {
        TelegramLog::new(Box::new(MemoryLog::new()))
            .with_transport(Arc::new(transport.clone()))
            .with_chat_id(42)
            .with_request_uri(URI)
    }

    fn memory_texts(log: &TelegramLog) -> Vec<String> {
        MemoryLog::from_state(&log.original().serialized().unwrap())
            .unwrap()
            .texts()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_below_minimum_is_recorded_but_not_relayed() {
        let transport = RecordingTransport::new();
        let log = configured(&transport);

        let next = log.with_entry(&entry(Level::Debug, "noise")).unwrap();

        assert_eq!(transport.call_count(), 0);
        assert_eq!(memory_texts(&next), vec!["noise"]);
    }

    #[test]
    fn test_at_minimum_is_relayed() {
        let transport = RecordingTransport::new();
        let log = configured(&transport).with_min_level(Level::Warning);

        let next = log.with_entry(&entry(Level::Warning, "disk at 91%")).unwrap();

        let posts = transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].address, URI);
        assert_eq!(posts[0].field("chat_id"), Some("42"));
        assert_eq!(
            posts[0].field("text"),
            Some("2021-06-01T12:00:00Z\nWARNING\n===\ndisk at 91%\n")
        );
        assert_eq!(posts[0].fields.len(), 2);
        assert_eq!(memory_texts(&next), vec!["disk at 91%"]);
    }

    #[test]
    fn test_receiver_is_not_mutated() {
        let transport = RecordingTransport::new();
        let log = configured(&transport);

        let _ = log.with_entry(&entry(Level::Error, "first")).unwrap();
        let changed = log.with_chat_id(7).with_min_level(Level::Critical);

        assert!(memory_texts(&log).is_empty());
        assert_eq!(log.chat_id(), Some(42));
        assert_eq!(log.min_level(), Level::Info);
        assert_eq!(changed.chat_id(), Some(7));
        assert_eq!(changed.request_uri(), Some(URI));
    }

    #[test]
    fn test_missing_chat_id_is_configuration_error() {
        let transport = RecordingTransport::new();
        let log = TelegramLog::new(Box::new(MemoryLog::new()))
            .with_transport(Arc::new(transport.clone()))
            .with_request_uri(URI);

        let result = log.with_entry(&entry(Level::Error, "lost"));

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_missing_request_uri_is_configuration_error() {
        let transport = RecordingTransport::new();
        let log = TelegramLog::new(Box::new(MemoryLog::new()))
            .with_transport(Arc::new(transport.clone()))
            .with_chat_id(42);

        let result = log.with_entry(&entry(Level::Info, "lost"));

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_unconfigured_log_still_accepts_quiet_entries() {
        let log = TelegramLog::new(Box::new(MemoryLog::new()));
        let next = log.with_entry(&entry(Level::Debug, "fine")).unwrap();
        assert_eq!(memory_texts(&next), vec!["fine"]);
    }

    #[test]
    fn test_delivery_failure_is_surfaced() {
        let transport = FailingTransport::new(StatusCode::BAD_REQUEST);
        let log = TelegramLog::new(Box::new(MemoryLog::new()))
            .with_transport(Arc::new(transport.clone()))
            .with_chat_id(42)
            .with_request_uri(URI);

        let result = log.with_entry(&entry(Level::Error, "boom"));

        assert!(matches!(result, Err(Error::Delivery(_))));
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn test_malformed_entry_is_surfaced() {
        let transport = RecordingTransport::new();
        let log = configured(&transport);
        let mut fields = Map::new();
        fields.insert("text".to_string(), json!("no level, no time"));
        let raw = RawEntry { level: Level::Error, fields };

        let result = log.with_entry(&raw);

        assert!(matches!(result, Err(Error::MalformedEntry(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_with_embedded_replaces_plain_log() {
        let log = TelegramLog::new(Box::new(MemoryLog::new()));
        let next = log.with_embedded(Box::new(NullLog));
        assert_eq!(next.original().type_tag(), "null");
        assert_eq!(log.original().type_tag(), "memory");
    }

    #[test]
    fn test_with_embedded_delegates_to_embeddable_log() {
        let log = TelegramLog::new(Box::new(MultiLog::new()))
            .with_embedded(Box::new(MemoryLog::new()))
            .with_embedded(Box::new(NullLog));

        assert_eq!(log.original().type_tag(), "multi");
        let state = log.original().serialized().unwrap();
        let tags: Vec<_> = state["logs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|child| child["typeTag"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["memory", "null"]);
    }

    #[test]
    fn test_snapshot_shape() {
        let transport = RecordingTransport::new();
        let log = configured(&transport)
            .with_min_level(Level::Warning)
            .with_entry(&entry(Level::Debug, "kept"))
            .unwrap();

        let value = log.serialized().unwrap();

        assert_eq!(
            value,
            json!({
                "i": { "chatId": 42, "requestUri": URI },
                "minLevel": 2,
                "original": {
                    "typeTag": "memory",
                    "state": { "entries": [
                        { "dt": "2021-06-01T12:00:00Z", "level": 0, "text": "kept" }
                    ] }
                }
            })
        );
    }

    #[test]
    fn test_snapshot_omits_unset_settings() {
        let value = TelegramLog::new(Box::new(NullLog)).serialized().unwrap();
        assert_eq!(value["i"], json!({}));
        assert_eq!(value["minLevel"], json!(1));
    }

    #[test]
    fn test_restored_rejects_bad_shapes() {
        let log = TelegramLog::default();
        let bad = [
            json!([]),
            json!({ "i": {}, "original": { "typeTag": "null", "state": {} } }),
            json!({ "i": {}, "minLevel": "2", "original": { "typeTag": "null", "state": {} } }),
            json!({ "i": [], "minLevel": 2, "original": { "typeTag": "null", "state": {} } }),
            json!({ "i": {}, "minLevel": 2, "original": { "typeTag": 5, "state": {} } }),
            json!({ "i": {}, "minLevel": 2, "original": { "typeTag": "null" } }),
            json!({ "i": { "chatId": "42" }, "minLevel": 2, "original": { "typeTag": "null", "state": {} } }),
            json!({ "i": {}, "minLevel": 9, "original": { "typeTag": "null", "state": {} } }),
            json!({ "i": {}, "minLevel": 2, "original": { "typeTag": "nope", "state": {} } }),
        ];

        for data in bad {
            let result = log.restored(&data);
            assert!(matches!(result, Err(Error::MalformedSnapshot(_))), "accepted {data}");
        }
    }

    #[test]
    fn test_restored_keeps_receiver_transport() {
        let transport = RecordingTransport::new();
        let receiver = TelegramLog::default().with_transport(Arc::new(transport.clone()));
        let data = json!({
            "i": { "chatId": 7, "requestUri": "x" },
            "minLevel": 2,
            "original": { "typeTag": "memory", "state": { "entries": [] } }
        });

        let restored = receiver.restored(&data).unwrap();
        restored.with_entry(&entry(Level::Error, "after restore")).unwrap();

        assert_eq!(restored.chat_id(), Some(7));
        assert_eq!(restored.request_uri(), Some("x"));
        assert_eq!(restored.min_level(), Level::Warning);
        assert_eq!(transport.posts()[0].address, "x");
    }

    #[test]
    fn test_debug_output_hides_request_uri() {
        let log = TelegramLog::default()
            .with_chat_id(42)
            .with_request_uri("https://api.telegram.org/bot123:secret-token/sendMessage");

        let output = format!("{:?}", log);

        assert!(output.contains("<redacted>"));
        assert!(!output.contains("secret-token"));
    }

    #[test]
    fn test_nested_decorator_is_not_restorable_by_default() {
        let inner = TelegramLog::new(Box::new(MemoryLog::new()))
            .with_chat_id(1)
            .with_request_uri("inner");
        let outer = TelegramLog::new(Box::new(inner));

        let result = TelegramLog::default().restored(&outer.serialized().unwrap());

        assert!(matches!(result, Err(Error::MalformedSnapshot(_))));
    }

    #[test]
    fn test_nested_decorator_round_trip() {
        let inner = TelegramLog::new(Box::new(MemoryLog::new()))
            .with_chat_id(1)
            .with_request_uri("inner");
        let outer = TelegramLog::new(Box::new(inner)).with_chat_id(2).with_request_uri("outer");

        let registry = LogRegistry::with_defaults()
            .with(TelegramLog::TYPE_TAG, || Box::new(TelegramLog::default()));
        let restored = TelegramLog::default()
            .with_registry(Arc::new(registry))
            .restored(&outer.serialized().unwrap())
            .unwrap();

        assert_eq!(restored.serialized().unwrap(), outer.serialized().unwrap());
        assert_eq!(restored.original().type_tag(), "telegram");
    }
}
