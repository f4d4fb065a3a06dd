//! Offline log entries, before and after storage.

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use super::timestamp::storage_format;
use super::{OfflineEventType, SessionId, UserId};

/// A validated event ready to be stored.
///
/// Produced only by batch normalization; `timestamp` is `None` when the
/// client did not send one, in which case the store assigns the current
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    /// Session the event occurred in.
    pub session_id: SessionId,
    /// User who experienced or triggered the event.
    pub user_id: UserId,
    /// Client-observed time at storage precision.
    pub timestamp: Option<NaiveDateTime>,
    /// What happened.
    pub event_type: OfflineEventType,
    /// Free-form context sent by the client.
    pub details: Option<String>,
}

/// A stored, immutable offline log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OfflineLogEntry {
    /// Row identifier assigned by the store.
    pub id: i64,
    /// Session the event occurred in.
    pub session_id: SessionId,
    /// User who experienced or triggered the event.
    pub user_id: UserId,
    /// Event time rendered as `YYYY-MM-DD HH:MM:SS` (UTC).
    #[serde(serialize_with = "storage_format::serialize")]
    #[schema(value_type = String, example = "2024-01-01 10:00:00")]
    pub timestamp: NaiveDateTime,
    /// What happened.
    pub event_type: OfflineEventType,
    /// Free-form context sent by the client.
    pub details: Option<String>,
}
