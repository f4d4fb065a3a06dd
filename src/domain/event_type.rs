//! Closed set of events a POS front end reports while offline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of client-observed event recorded in the offline log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OfflineEventType {
    /// The operator tried to close the session while offline and was warned.
    AttemptedClose,
    /// The operator confirmed closing the session while offline.
    AcceptedClose,
    /// The terminal lost network connectivity.
    NetworkLost,
    /// The terminal regained network connectivity.
    NetworkRecovered,
}

impl OfflineEventType {
    /// Every event type, in catalog order.
    pub const ALL: [Self; 4] = [
        Self::AttemptedClose,
        Self::AcceptedClose,
        Self::NetworkLost,
        Self::NetworkRecovered,
    ];

    /// Returns the wire and storage name of the event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptedClose => "attempted_close",
            Self::AcceptedClose => "accepted_close",
            Self::NetworkLost => "network_lost",
            Self::NetworkRecovered => "network_recovered",
        }
    }

    /// Returns the label shown to back-office users.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AttemptedClose => "Offline close attempt (warning)",
            Self::AcceptedClose => "Offline close accepted",
            Self::NetworkLost => "Connection lost (offline)",
            Self::NetworkRecovered => "Connection recovered (online)",
        }
    }
}

impl fmt::Display for OfflineEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known event type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for OfflineEventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}
