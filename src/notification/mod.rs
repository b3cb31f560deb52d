//! Relaying log entries to chat endpoints.
//!
//! `telegram` holds the forwarding decorator; `transport` is the seam it uses
//! to reach the network, so tests and callers can swap the HTTP client out.
pub mod telegram;
pub mod transport;

pub use telegram::{Snapshot, TelegramLog};
pub use transport::{HttpTransport, Transport, TransportError};
