//! Batch normalization for offline log ingestion.
//!
//! Validation is a pure pass over the raw records: it never fails as a
//! whole, it splits the batch into accepted [`NewLogEntry`] values and a
//! list of [`Discard`]s. Storage happens afterwards through a
//! [`TrustedBatch`], which can only be built from an [`OperatorGrant`].

use serde_json::{Map, Value};

use crate::domain::timestamp::parse_client_timestamp;
use crate::domain::{Caller, NewLogEntry, OfflineEventType, SessionId, UserId};

const SESSION_KEYS: &[&str] = &["session_id", "session"];
const USER_KEYS: &[&str] = &["user_id", "user"];
const EVENT_TYPE_KEYS: &[&str] = &["event_type", "eventType"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp"];
const DETAILS_KEYS: &[&str] = &["details"];

/// Why a raw record was left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscardReason {
    /// The record is not a JSON object.
    #[error("record is not an object")]
    NotAnObject,
    /// A required field is absent or empty.
    #[error("missing required field {0}")]
    MissingField(&'static str),
    /// The event type is not part of the catalog.
    #[error("unknown event type {0:?}")]
    UnknownEventType(String),
    /// A session or user reference is not a positive integer.
    #[error("{0} is not a record id")]
    MalformedReference(&'static str),
    /// The timestamp does not match the client input format.
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(String),
}

/// A record dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discard {
    /// Position of the record in the submitted batch.
    pub index: usize,
    /// What was wrong with it.
    pub reason: DiscardReason,
    /// The record as received, for diagnostics.
    pub payload: String,
}

impl Discard {
    /// Returns `true` for discards caused by an unparseable timestamp.
    #[must_use]
    pub const fn is_timestamp_error(&self) -> bool {
        matches!(self.reason, DiscardReason::InvalidTimestamp(_))
    }
}

/// Result of normalizing one submitted batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Records that passed every check, in submission order.
    pub accepted: Vec<NewLogEntry>,
    /// Records that were dropped, in submission order.
    pub discarded: Vec<Discard>,
}

/// Proof that a caller passed the POS operator capability gate.
#[derive(Debug)]
pub struct OperatorGrant {
    user_id: UserId,
}

impl OperatorGrant {
    /// The user the grant was issued to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Issues an [`OperatorGrant`] if `caller` may record offline logs.
#[must_use]
pub fn authorize(caller: &Caller) -> Option<OperatorGrant> {
    caller.can_operate_pos().then_some(OperatorGrant {
        user_id: caller.user_id,
    })
}

/// Validated entries cleared for a privileged insert.
///
/// Field-level checks were satisfied by the capability gate, so stores
/// write these entries without further authorization.
#[derive(Debug)]
pub struct TrustedBatch {
    granted_to: UserId,
    entries: Vec<NewLogEntry>,
}

impl TrustedBatch {
    /// Wraps `entries` under the authority of `grant`.
    #[must_use]
    pub fn new(grant: &OperatorGrant, entries: Vec<NewLogEntry>) -> Self {
        Self {
            granted_to: grant.user_id,
            entries,
        }
    }

    /// The operator on whose behalf the batch is written.
    #[must_use]
    pub const fn granted_to(&self) -> UserId {
        self.granted_to
    }

    /// Entries in submission order.
    #[must_use]
    pub fn entries(&self) -> &[NewLogEntry] {
        &self.entries
    }

    /// Consumes the batch, yielding its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<NewLogEntry> {
        self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the batch holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits raw client records into storable entries and discards.
#[must_use]
pub fn normalize_batch(records: &[Value]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (index, record) in records.iter().enumerate() {
        match normalize_record(record) {
            Ok(entry) => batch.accepted.push(entry),
            Err(reason) => batch.discarded.push(Discard {
                index,
                reason,
                payload: record.to_string(),
            }),
        }
    }
    batch
}

/// Validates one raw record.
///
/// # Errors
///
/// Returns the first [`DiscardReason`] found. Required fields are checked
/// before their formats, and the timestamp last.
pub fn normalize_record(record: &Value) -> Result<NewLogEntry, DiscardReason> {
    let Some(fields) = record.as_object() else {
        return Err(DiscardReason::NotAnObject);
    };

    let session = required(fields, SESSION_KEYS)?;
    let user = required(fields, USER_KEYS)?;
    let event_type = required(fields, EVENT_TYPE_KEYS)?;

    let session_id = record_id(session)
        .map(SessionId::new)
        .ok_or(DiscardReason::MalformedReference("session_id"))?;
    let user_id = record_id(user)
        .map(UserId::new)
        .ok_or(DiscardReason::MalformedReference("user_id"))?;
    let event_type = match event_type {
        Value::String(name) => name
            .parse::<OfflineEventType>()
            .map_err(|e| DiscardReason::UnknownEventType(e.0))?,
        other => return Err(DiscardReason::UnknownEventType(other.to_string())),
    };

    let timestamp = match lookup(fields, TIMESTAMP_KEYS).filter(|v| is_truthy(v)) {
        None => None,
        Some(Value::String(raw)) => Some(
            parse_client_timestamp(raw)
                .map_err(|_| DiscardReason::InvalidTimestamp(raw.clone()))?,
        ),
        Some(other) => return Err(DiscardReason::InvalidTimestamp(other.to_string())),
    };

    let details = match lookup(fields, DETAILS_KEYS) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(NewLogEntry {
        session_id,
        user_id,
        timestamp,
        event_type,
        details,
    })
}

/// Returns the value under the first key of `keys` present in `fields`.
fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

/// Returns a required value, rejecting absent and empty ones.
fn required<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Result<&'a Value, DiscardReason> {
    let canonical = keys.first().copied().unwrap_or_default();
    lookup(fields, keys)
        .filter(|v| is_truthy(v))
        .ok_or(DiscardReason::MissingField(canonical))
}

/// `null`, `false`, zero, and empty strings or containers count as empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Reads a positive record id from a number or a decimal string.
fn record_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}
