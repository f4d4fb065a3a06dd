//! Domain layer: offline log entries and the identities they reference.
//!
//! This module holds the server-side model: the closed event type set,
//! typed references to host sessions and users, the calling identity, and
//! the timestamp formats used between clients and storage.

pub mod caller;
pub mod event_type;
pub mod ids;
pub mod log_entry;
pub mod timestamp;

pub use caller::Caller;
pub use event_type::OfflineEventType;
pub use ids::{SessionId, UserId};
pub use log_entry::{NewLogEntry, OfflineLogEntry};
