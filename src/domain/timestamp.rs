//! Timestamp formats shared by ingestion and storage.
//!
//! Clients send ISO-8601 instants with millisecond precision and a literal
//! `Z`. The log table keeps naive UTC date-times at second precision, and
//! renders them as `YYYY-MM-DD HH:MM:SS`.

use chrono::{NaiveDateTime, SubsecRound, Timelike, Utc};

/// Format every client-supplied `timestamp` must match.
pub const INPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3fZ";

/// Format the log table uses to render stored timestamps.
pub const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape of [`INPUT_TIMESTAMP_FORMAT`], one byte per position: `d` is an
/// ASCII digit, anything else must appear literally.
const INPUT_SHAPE: &[u8; 24] = b"dddd-dd-ddTdd:dd:dd.dddZ";

/// Why a client timestamp was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The text is not laid out as `YYYY-MM-DDTHH:MM:SS.sssZ`.
    #[error("timestamp is not in YYYY-MM-DDTHH:MM:SS.sssZ form")]
    Shape,
    /// The fields are laid out correctly but name no calendar instant.
    #[error("timestamp is out of range: {0}")]
    OutOfRange(#[from] chrono::ParseError),
    /// Second `60` has no representation in the log table.
    #[error("leap seconds are not accepted")]
    LeapSecond,
}

/// Parses a client timestamp and truncates it to storage precision.
///
/// Only the exact 24-byte layout of [`INPUT_TIMESTAMP_FORMAT`] is
/// accepted; chrono alone tolerates signs, short years, unpadded fields
/// and leading whitespace.
///
/// # Errors
///
/// Returns [`TimestampError`] when `raw` does not match the layout, names
/// an impossible date or time, or falls on a leap second.
pub fn parse_client_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    if !has_input_shape(raw.as_bytes()) {
        return Err(TimestampError::Shape);
    }
    let ts = NaiveDateTime::parse_from_str(raw, INPUT_TIMESTAMP_FORMAT)?;
    if ts.nanosecond() >= 1_000_000_000 {
        return Err(TimestampError::LeapSecond);
    }
    Ok(ts.trunc_subsecs(0))
}

fn has_input_shape(bytes: &[u8]) -> bool {
    bytes.len() == INPUT_SHAPE.len()
        && bytes.iter().zip(INPUT_SHAPE).all(|(b, want)| match want {
            b'd' => b.is_ascii_digit(),
            literal => b == literal,
        })
}

/// Renders a stored timestamp in [`STORAGE_TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_storage(ts: &NaiveDateTime) -> String {
    ts.format(STORAGE_TIMESTAMP_FORMAT).to_string()
}

/// Current UTC time at storage precision, used when a client omits the
/// timestamp.
#[must_use]
pub fn storage_now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Serde adapter writing timestamps in [`STORAGE_TIMESTAMP_FORMAT`].
pub mod storage_format {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    /// Serializes `ts` as a `YYYY-MM-DD HH:MM:SS` string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_storage(ts))
    }
}
