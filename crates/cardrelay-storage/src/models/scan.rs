use crate::error::{StorageError, StorageResult};
use cardrelay_core::{ScanEvent, ScanId, StationId, parse_timestamp};
use serde::Serialize;
use std::str::FromStr;

/// A scan waiting in the backlog.
///
/// Maps to the `scans` table. The station id is not stored: it belongs to
/// the running process and is supplied again when the row is read back.
///
/// # Fields
///
/// * `card_number` - Digits read from the card, possibly empty
/// * `time_stamp` - Completion time in wire format (ISO-8601, UTC)
/// * `scan_id` - Hyphenated UUID, unique across the table
///
/// # Examples
///
/// ```
/// use cardrelay_core::{ScanEvent, StationId};
/// use cardrelay_storage::models::PersistedScan;
///
/// let scan = ScanEvent::new("0012345678", StationId::new("lobby"));
/// let row = PersistedScan::from_event(&scan);
///
/// let back = row.to_event(StationId::new("lobby")).unwrap();
/// assert_eq!(back.scan_id, scan.scan_id);
/// assert_eq!(back.card_number, scan.card_number);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedScan {
    pub card_number: String,
    pub time_stamp: String,
    pub scan_id: String,
}

impl PersistedScan {
    /// Row for `scan`.
    pub fn from_event(scan: &ScanEvent) -> Self {
        Self {
            card_number: scan.card_number.clone(),
            time_stamp: scan.timestamp_string(),
            scan_id: scan.scan_id.to_string(),
        }
    }

    /// Rebuild the scan, stamping it with `station`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if the id or timestamp do not parse.
    pub fn to_event(&self, station: StationId) -> StorageResult<ScanEvent> {
        let scan_id = ScanId::from_str(&self.scan_id)
            .map_err(|e| StorageError::corrupt(&self.scan_id, e.to_string()))?;
        let timestamp = parse_timestamp(&self.time_stamp)
            .map_err(|e| StorageError::corrupt(&self.scan_id, e.to_string()))?;

        Ok(ScanEvent::from_parts(
            scan_id,
            timestamp,
            self.card_number.clone(),
            station,
        ))
    }
}

/// A `scans` row as SQLite returns it. The columns are nullable, so a
/// row is only a [`PersistedScan`] once every column is present.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ScanRow {
    card_number: Option<String>,
    time_stamp: Option<String>,
    scan_id: Option<String>,
}

impl TryFrom<ScanRow> for PersistedScan {
    type Error = StorageError;

    fn try_from(row: ScanRow) -> StorageResult<Self> {
        let Some(scan_id) = row.scan_id else {
            return Err(StorageError::corrupt("<null>", "scan_id is NULL"));
        };
        let Some(card_number) = row.card_number else {
            return Err(StorageError::corrupt(scan_id, "card_number is NULL"));
        };
        let Some(time_stamp) = row.time_stamp else {
            return Err(StorageError::corrupt(scan_id, "time_stamp is NULL"));
        };

        Ok(Self {
            card_number,
            time_stamp,
            scan_id,
        })
    }
}
