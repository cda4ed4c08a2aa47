use crate::{Result, error::Error};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Globally unique scan identifier (UUID v4).
///
/// Assigned once when the scan completes and used as the idempotency key by
/// the backlog store and the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    /// Generate a fresh random scan id.
    #[must_use]
    pub fn new() -> Self {
        ScanId(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for ScanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(ScanId)
            .map_err(|_| Error::InvalidScanId(s.to_string()))
    }
}

impl From<Uuid> for ScanId {
    fn from(uuid: Uuid) -> Self {
        ScanId(uuid)
    }
}

/// Identifier of the kiosk installation.
///
/// Shared by every reader attached to this host; it is not a reader id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    /// Create a station id from its configured value.
    pub fn new(id: impl Into<String>) -> Self {
        StationId(id.into())
    }

    /// Get the station id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format a UTC instant the way scans carry it on the wire and on disk.
///
/// ISO-8601 with microseconds and an explicit `+00:00` offset.
///
/// # Examples
///
/// ```
/// use cardrelay_core::format_timestamp;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2025, 10, 16, 8, 15, 2).unwrap();
/// assert_eq!(format_timestamp(&ts), "2025-10-16T08:15:02.000000+00:00");
/// ```
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a timestamp produced by [`format_timestamp`] (or any RFC 3339 value).
///
/// # Errors
/// Returns `Error::InvalidTimestamp` if the string is not RFC 3339.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp(format!("{s}: {e}")))
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// One completed card read.
///
/// The unit of work from capture to the collector. Field order matches the
/// JSON object the collector expects:
/// `{"scan_id", "timestamp", "card_number", "device_id"}`.
///
/// # Examples
///
/// ```
/// use cardrelay_core::{ScanEvent, StationId};
///
/// let scan = ScanEvent::new("0012345678", StationId::new("lobby"));
/// assert_eq!(scan.card_number, "0012345678");
/// assert_eq!(scan.device_id.as_str(), "lobby");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Unique id, assigned at completion.
    pub scan_id: ScanId,

    /// When the terminator key completed the code.
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,

    /// Digits read between two terminators. May be empty.
    pub card_number: String,

    /// Station this daemon runs on.
    pub device_id: StationId,
}

impl ScanEvent {
    /// Create a scan completed now, with a fresh id.
    pub fn new(card_number: impl Into<String>, device_id: StationId) -> Self {
        Self {
            scan_id: ScanId::new(),
            timestamp: Utc::now(),
            card_number: card_number.into(),
            device_id,
        }
    }

    /// Rebuild a scan from stored parts.
    pub fn from_parts(
        scan_id: ScanId,
        timestamp: DateTime<Utc>,
        card_number: impl Into<String>,
        device_id: StationId,
    ) -> Self {
        Self {
            scan_id,
            timestamp,
            card_number: card_number.into(),
            device_id,
        }
    }

    /// Timestamp rendered in wire format.
    #[must_use]
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}
