//! Offline log ingestion and listing DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{OfflineEventType, OfflineLogEntry};

/// Request body for `POST /offline-logs/batch`.
///
/// Records are kept as raw JSON: each one is validated on its own and a
/// malformed record never rejects the request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLogEntriesRequest {
    /// Events buffered by the client, oldest first.
    #[schema(value_type = Vec<Object>, example = json!([{
        "session_id": 1,
        "user_id": 5,
        "event_type": "network_lost",
        "timestamp": "2024-01-01T10:00:00.000Z"
    }]))]
    pub logs: Vec<serde_json::Value>,
}

/// Response body for `POST /offline-logs/batch`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateLogEntriesResponse {
    /// `false` only when the caller lacks the POS operator capability.
    pub result: bool,
}

/// Query parameters for `GET /offline-logs`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogListParams {
    /// Only entries of this session.
    #[serde(default)]
    pub session_id: Option<i64>,
    /// Only entries of this user.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Only entries of this event type.
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub event_type: Option<OfflineEventType>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Paginated list response for `GET /offline-logs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogListResponse {
    /// Entries in ascending timestamp order.
    pub data: Vec<OfflineLogEntry>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Catalog entry for `GET /config/event-types`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventTypeInfo {
    /// Wire name of the event type.
    pub event_type: OfflineEventType,
    /// Back-office label.
    pub label: &'static str,
}

impl From<OfflineEventType> for EventTypeInfo {
    fn from(event_type: OfflineEventType) -> Self {
        Self {
            event_type,
            label: event_type.label(),
        }
    }
}
