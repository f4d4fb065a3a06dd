//! Query and result models for the log table.

use chrono::NaiveDateTime;

use crate::domain::{OfflineEventType, OfflineLogEntry, SessionId, UserId};
use crate::error::GatewayError;

/// Filters and window for a log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Only entries of this session.
    pub session_id: Option<SessionId>,
    /// Only entries of this user.
    pub user_id: Option<UserId>,
    /// Only entries of this event type.
    pub event_type: Option<OfflineEventType>,
    /// Number of matching entries to skip.
    pub offset: u32,
    /// Maximum number of entries to return.
    pub limit: u32,
}

impl LogQuery {
    /// Returns `true` if `entry` passes every filter of the query.
    #[must_use]
    pub fn matches(&self, entry: &OfflineLogEntry) -> bool {
        self.session_id.is_none_or(|id| entry.session_id == id)
            && self.user_id.is_none_or(|id| entry.user_id == id)
            && self.event_type.is_none_or(|kind| entry.event_type == kind)
    }
}

/// One page of a log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    /// Entries in ascending timestamp order.
    pub entries: Vec<OfflineLogEntry>,
    /// Number of entries matching the filters across all pages.
    pub total: u64,
}

/// Column tuple of a `pos_offline_log` row as read by `sqlx`.
pub type LogRow = (i64, i64, i64, NaiveDateTime, String, Option<String>);

/// Converts a raw row into a domain entry.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the stored event type is
/// not part of the catalog.
pub fn entry_from_row(row: LogRow) -> Result<OfflineLogEntry, GatewayError> {
    let (id, session_id, user_id, timestamp, event_type, details) = row;
    let event_type = event_type
        .parse::<OfflineEventType>()
        .map_err(|e| GatewayError::PersistenceError(format!("row {id}: {e}")))?;
    Ok(OfflineLogEntry {
        id,
        session_id: SessionId::new(session_id),
        user_id: UserId::new(user_id),
        timestamp,
        event_type,
        details,
    })
}
