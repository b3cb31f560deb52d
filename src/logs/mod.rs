//! Concrete logs that the decorator can wrap.
//!
//! These cover the common cases: keeping entries in memory, dropping them,
//! emitting them as `tracing` events, and fanning out to several logs at once.

pub mod memory;
pub mod multi;
pub mod null;
pub mod tracing_log;

pub use memory::MemoryLog;
pub use multi::MultiLog;
pub use null::NullLog;
pub use tracing_log::TracingLog;
