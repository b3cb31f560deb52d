//! Test doubles for the transport and entry seams.

use crate::core::{Level, LogEntry};
use crate::notification::transport::{Transport, TransportError};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// One recorded call to [`Transport::post`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub address: String,
    pub fields: Vec<(String, String)>,
}

impl RecordedPost {
    /// Returns the value of the named form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A transport that records every post and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    posts: Arc<Mutex<Vec<RecordedPost>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    fn post(&self, address: &str, fields: &[(&str, String)]) -> Result<(), TransportError> {
        self.posts.lock().unwrap().push(RecordedPost {
            address: address.to_string(),
            fields: fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        });
        Ok(())
    }
}

/// A transport that counts calls and always answers with the given status.
#[derive(Debug, Clone)]
pub struct FailingTransport {
    status: StatusCode,
    calls: Arc<Mutex<usize>>,
}

impl FailingTransport {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Transport for FailingTransport {
    fn post(&self, _address: &str, _fields: &[(&str, String)]) -> Result<(), TransportError> {
        *self.calls.lock().unwrap() += 1;
        Err(TransportError::Status {
            status: self.status,
            body: "rejected by test transport".to_string(),
        })
    }
}

/// An entry whose serialized form only carries the given fields.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub level: Level,
    pub fields: Map<String, Value>,
}

impl LogEntry for RawEntry {
    fn level(&self) -> Level {
        self.level
    }

    fn serialized(&self) -> Map<String, Value> {
        self.fields.clone()
    }
}
