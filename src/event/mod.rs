//! Lifecycle event log
//!
//! - `log`: Event, EventKind, EventLog (append-only, thread-safe)

mod log;

pub use log::{Event, EventKind, EventLog};
