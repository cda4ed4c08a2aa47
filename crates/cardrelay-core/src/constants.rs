//! Core constants for the card relay daemon.
//!
//! Defaults for the collector protocol, the scan handoff, and the local
//! parameter file live here so every crate agrees on them.
//!
//! # Usage
//!
//! ```
//! use cardrelay_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(SUCCESS_MARKER, "success");
//!
//! let poll = Duration::from_secs(DEFAULT_QUEUE_POLL_SECS);
//! assert_eq!(poll.as_secs(), 30);
//! ```

// ============================================================================
// Collector Protocol
// ============================================================================

/// Response body the collector returns when a batch was accepted.
///
/// Anything else, including a 200 with a different body, counts as a
/// failed delivery.
pub const SUCCESS_MARKER: &str = "success";

/// Query parameter carrying the base64 batch signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Collector URL prefix; the script id and [`COLLECTOR_URL_SUFFIX`] follow.
///
/// # Examples
///
/// ```
/// use cardrelay_core::constants::{COLLECTOR_URL_PREFIX, COLLECTOR_URL_SUFFIX};
///
/// let url = format!("{COLLECTOR_URL_PREFIX}AKfy123{COLLECTOR_URL_SUFFIX}");
/// assert_eq!(url, "https://script.google.com/macros/s/AKfy123/exec");
/// ```
pub const COLLECTOR_URL_PREFIX: &str = "https://script.google.com/macros/s/";

/// Collector URL suffix appended after the script id.
pub const COLLECTOR_URL_SUFFIX: &str = "/exec";

/// Default timeout for one delivery attempt (milliseconds).
///
/// # Value: 10000ms (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Minimum accepted request timeout (milliseconds).
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Scan Handoff
// ============================================================================

/// How long the delivery worker waits on the scan channel before looping.
///
/// The timeout exists only for liveness; expiry is a no-op cycle and never
/// drops a scan.
///
/// # Value: 30 seconds
pub const DEFAULT_QUEUE_POLL_SECS: u64 = 30;

// ============================================================================
// Local Files
// ============================================================================

/// Default location of the parameter file read at startup.
pub const DEFAULT_CONFIG_PATH: &str = "/var/database/config.json";

/// Default location of the SQLite backlog database.
pub const DEFAULT_DATABASE_PATH: &str = "/var/database/robotarians.db";
