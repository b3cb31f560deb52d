//! Error types shared by the decorator, the formatter and the registry.

use crate::notification::transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Forwarding was required but the chat id or the request uri is unset.
    #[error("not configured for delivery: {0}")]
    Configuration(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] TransportError),

    #[error("malformed log entry: {0}")]
    MalformedEntry(String),

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
