//! Startup configuration.
//!
//! The parameter file is read once at startup into an immutable
//! [`RelayConfig`], which is then handed to the components that need it:
//! the signer gets the secret, capture gets the station id and the reader
//! allow-list, the sender gets the collector URL.
//!
//! # File Format
//!
//! ```json
//! {
//!     "script_id": "AKfycbx...",
//!     "hmac_key": "c2VjcmV0LWtleQ==",
//!     "device_id": "front-desk",
//!     "usb_devices": ["Sycreader USB Reader"]
//! }
//! ```
//!
//! Optional keys: `collector_url`, `database_path`, `request_timeout_ms`,
//! `queue_poll_secs`.

use crate::constants::{
    COLLECTOR_URL_PREFIX, COLLECTOR_URL_SUFFIX, DEFAULT_DATABASE_PATH, DEFAULT_QUEUE_POLL_SECS,
    DEFAULT_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS,
};
use crate::{Error, Result, StationId};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Case-insensitive list of reader names this daemon may capture from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAllowList {
    names: Vec<String>,
}

impl DeviceAllowList {
    /// Build an allow-list; names are lowercased once here.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Check whether an enumerated device name is allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardrelay_core::DeviceAllowList;
    ///
    /// let allow = DeviceAllowList::new(["Sycreader USB Reader"]);
    /// assert!(allow.is_allowed("SYCREADER usb reader"));
    /// assert!(!allow.is_allowed("AT Translated Set 2 keyboard"));
    /// ```
    #[must_use]
    pub fn is_allowed(&self, device_name: &str) -> bool {
        let name = device_name.trim().to_lowercase();
        self.names.iter().any(|allowed| *allowed == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    script_id: Option<String>,
    hmac_key: Option<String>,
    device_id: Option<String>,
    usb_devices: Option<Vec<String>>,
    collector_url: Option<String>,
    database_path: Option<PathBuf>,
    request_timeout_ms: Option<u64>,
    queue_poll_secs: Option<u64>,
}

/// Immutable daemon configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Collector deployment id.
    pub script_id: String,

    /// Base64 shared secret for batch signatures.
    pub hmac_key: String,

    /// Station id placed in every payload.
    pub station_id: StationId,

    /// Readers to capture from.
    pub allowed_devices: DeviceAllowList,

    /// Full collector URL.
    pub collector_url: String,

    /// SQLite backlog location.
    pub database_path: PathBuf,

    /// Timeout for one delivery attempt.
    pub request_timeout: Duration,

    /// Scan channel wait timeout.
    pub queue_poll: Duration,
}

impl RelayConfig {
    /// Load and validate the parameter file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Json` if it is
    /// not valid JSON, and `Error::MissingConfig` / `Error::Config` if a
    /// required value is absent or unusable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::debug!(
            "Loaded configuration from {} (station {}, {} allowed readers)",
            path.display(),
            config.station_id,
            config.allowed_devices.len()
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON document.
    ///
    /// # Errors
    /// See [`RelayConfig::load`].
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let script_id = required(raw.script_id, "script_id")?;
        let hmac_key = required(raw.hmac_key, "hmac_key")?;
        let device_id = required(raw.device_id, "device_id")?;

        let usb_devices = raw
            .usb_devices
            .ok_or_else(|| Error::MissingConfig("usb_devices".to_string()))?;
        let allowed_devices = DeviceAllowList::new(&usb_devices);
        if allowed_devices.is_empty() {
            return Err(Error::Config(
                "usb_devices must name at least one reader".to_string(),
            ));
        }

        let collector_url = match raw.collector_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!("{COLLECTOR_URL_PREFIX}{script_id}{COLLECTOR_URL_SUFFIX}"),
        };

        let request_timeout_ms = raw.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        if request_timeout_ms < MIN_REQUEST_TIMEOUT_MS {
            return Err(Error::Config(format!(
                "request_timeout_ms must be at least {MIN_REQUEST_TIMEOUT_MS}, got {request_timeout_ms}"
            )));
        }

        let queue_poll_secs = raw.queue_poll_secs.unwrap_or(DEFAULT_QUEUE_POLL_SECS);
        if queue_poll_secs == 0 {
            return Err(Error::Config(
                "queue_poll_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            script_id,
            hmac_key,
            station_id: StationId::new(device_id),
            allowed_devices,
            collector_url,
            database_path: raw
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            request_timeout: Duration::from_millis(request_timeout_ms),
            queue_poll: Duration::from_secs(queue_poll_secs),
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::MissingConfig(key.to_string())),
    }
}
